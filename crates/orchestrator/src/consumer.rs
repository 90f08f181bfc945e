//! Order event consumer.
//!
//! Each delivery is handed to its own task, so a slow order never holds
//! up the ones behind it. Settlement rules:
//! - a body that does not decode is rejected without requeue
//! - anything that decodes is acknowledged once the processor returns,
//!   whatever the fulfillment outcome

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderEvent;
use futures_util::{Stream, StreamExt};
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use saga::OrderProcessor;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::BrokerConfig;
use crate::error::ConsumerError;

/// A message taken from the order queue that still has to be settled.
#[async_trait]
pub trait InboundMessage: Send + Sync + 'static {
    fn body(&self) -> &[u8];

    /// Positive acknowledgment; the broker forgets the message.
    async fn ack(&self) -> Result<(), ConsumerError>;

    /// Negative acknowledgment without requeue.
    async fn reject(&self) -> Result<(), ConsumerError>;
}

#[async_trait]
impl InboundMessage for Delivery {
    fn body(&self) -> &[u8] {
        &self.data
    }

    async fn ack(&self) -> Result<(), ConsumerError> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .map_err(ConsumerError::Settle)
    }

    async fn reject(&self) -> Result<(), ConsumerError> {
        self.acker
            .nack(BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await
            .map_err(ConsumerError::Settle)
    }
}

/// How a message was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Rejected,
}

/// Decodes, processes and settles a single message.
pub async fn handle_message<P, M>(processor: &P, message: &M) -> Result<Settlement, ConsumerError>
where
    P: OrderProcessor + ?Sized,
    M: InboundMessage,
{
    metrics::counter!("consumer_messages_received").increment(1);

    let event = match OrderEvent::from_bytes(message.body()) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                error = %e,
                body = %String::from_utf8_lossy(message.body()),
                "rejecting undecodable message"
            );
            message.reject().await?;
            metrics::counter!("consumer_messages_rejected").increment(1);
            return Ok(Settlement::Rejected);
        }
    };

    let order_id = event.order_id;
    tracing::info!(%order_id, "order event received");

    if let Err(e) = processor.process(event).await {
        tracing::warn!(%order_id, error = %e, "fulfillment stopped early");
    }

    message.ack().await?;
    metrics::counter!("consumer_messages_acked").increment(1);
    tracing::info!(%order_id, "message acknowledged");

    Ok(Settlement::Acked)
}

/// Why [`dispatch`] stopped taking deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEnd {
    /// The delivery stream ended on its own.
    Exhausted,
    /// The shutdown future resolved first.
    Stopped,
}

/// Spawns a task per delivery until the stream ends, yields an error, or
/// `shutdown` resolves.
///
/// With a `limit`, a permit is acquired before the next delivery is taken
/// off the stream, so no message waits unprocessed on this side. Tasks
/// still running when dispatch stops are always awaited, which lets every
/// started saga settle its message before returning.
pub async fn dispatch<S, M, E, P, F>(
    deliveries: S,
    processor: Arc<P>,
    limit: Option<Arc<Semaphore>>,
    shutdown: F,
) -> Result<DispatchEnd, ConsumerError>
where
    S: Stream<Item = Result<M, E>>,
    M: InboundMessage,
    E: Display,
    P: OrderProcessor + ?Sized + 'static,
    F: Future<Output = ()>,
{
    let mut deliveries = std::pin::pin!(deliveries);
    let mut shutdown = std::pin::pin!(shutdown);
    let mut tasks = JoinSet::new();

    let outcome = loop {
        while let Some(finished) = tasks.try_join_next() {
            log_task_result(finished);
        }

        let permit = match &limit {
            Some(semaphore) => tokio::select! {
                biased;
                () = &mut shutdown => break Ok(DispatchEnd::Stopped),
                acquired = Arc::clone(semaphore).acquire_owned() => match acquired {
                    Ok(permit) => Some(permit),
                    Err(e) => break Err(ConsumerError::Subscription(e.to_string())),
                },
            },
            None => None,
        };

        let next = tokio::select! {
            biased;
            () = &mut shutdown => break Ok(DispatchEnd::Stopped),
            next = deliveries.next() => next,
        };
        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => break Err(ConsumerError::Subscription(e.to_string())),
            None => break Ok(DispatchEnd::Exhausted),
        };

        let processor = Arc::clone(&processor);
        tasks.spawn(async move {
            let _permit = permit;
            if let Err(e) = handle_message(processor.as_ref(), &message).await {
                tracing::error!(error = %e, "message left unsettled");
            }
        });
    };

    if !tasks.is_empty() {
        tracing::info!(in_flight = tasks.len(), "waiting for in-flight orders");
    }
    while let Some(finished) = tasks.join_next().await {
        log_task_result(finished);
    }

    outcome
}

fn log_task_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "message task failed");
    }
}

/// Subscription to the order queue.
pub struct OrderConsumer {
    connection: Connection,
    channel: Channel,
    config: BrokerConfig,
}

impl OrderConsumer {
    /// Connects to the broker and declares the exchange, queue and binding.
    #[tracing::instrument(skip(config), fields(exchange = %config.exchange, queue = %config.queue))]
    pub async fn connect(config: &BrokerConfig) -> Result<Self, ConsumerError> {
        let connection = Connection::connect(
            &config.url,
            ConnectionProperties::default().with_connection_name(config.consumer_tag.clone().into()),
        )
        .await
        .map_err(ConsumerError::Connection)?;

        let channel = connection
            .create_channel()
            .await
            .map_err(ConsumerError::Connection)?;

        if let Some(prefetch) = config.prefetch {
            channel
                .basic_qos(prefetch, BasicQosOptions::default())
                .await
                .map_err(ConsumerError::topology("prefetch limit"))?;
        }

        let consumer = Self {
            connection,
            channel,
            config: config.clone(),
        };
        consumer.declare_topology().await?;

        tracing::info!("connected to broker");
        Ok(consumer)
    }

    async fn declare_topology(&self) -> Result<(), ConsumerError> {
        let config = &self.config;

        self.channel
            .exchange_declare(
                &config.exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(ConsumerError::topology(format!("exchange {}", config.exchange)))?;

        self.channel
            .queue_declare(
                &config.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(ConsumerError::topology(format!("queue {}", config.queue)))?;

        self.channel
            .queue_bind(
                &config.queue,
                &config.exchange,
                &config.routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(ConsumerError::topology(format!(
                "binding {} -> {}",
                config.exchange, config.queue
            )))?;

        Ok(())
    }

    /// Consumes order events until the subscription fails or `shutdown`
    /// resolves.
    ///
    /// On shutdown the consumer is cancelled only after every started saga
    /// has settled its message. Deliveries the broker pushed but that were
    /// never taken go back to the queue when the channel closes. The broker
    /// ending the subscription on its own is reported as
    /// [`ConsumerError::SubscriptionClosed`].
    pub async fn run<P, F>(
        &self,
        processor: Arc<P>,
        max_in_flight: Option<usize>,
        shutdown: F,
    ) -> Result<(), ConsumerError>
    where
        P: OrderProcessor + ?Sized + 'static,
        F: Future<Output = ()>,
    {
        let deliveries = self
            .channel
            .basic_consume(
                &self.config.queue,
                &self.config.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| ConsumerError::Subscription(e.to_string()))?;

        tracing::info!(
            queue = %self.config.queue,
            max_in_flight = ?max_in_flight,
            "waiting for order events"
        );

        let limit = max_in_flight.map(|n| Arc::new(Semaphore::new(n)));
        match dispatch(deliveries, processor, limit, shutdown).await? {
            DispatchEnd::Stopped => {
                self.channel
                    .basic_cancel(&self.config.consumer_tag, BasicCancelOptions::default())
                    .await
                    .map_err(|e| ConsumerError::Subscription(e.to_string()))?;
                tracing::info!("order consumer cancelled");
                Ok(())
            }
            DispatchEnd::Exhausted => Err(ConsumerError::SubscriptionClosed),
        }
    }

    /// Closes the channel and the connection.
    pub async fn close(&self) -> Result<(), ConsumerError> {
        self.channel
            .close(200, "shutting down")
            .await
            .map_err(ConsumerError::Connection)?;
        self.connection
            .close(200, "shutting down")
            .await
            .map_err(ConsumerError::Connection)
    }
}
