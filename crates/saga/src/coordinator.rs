//! Saga coordinator for the order fulfillment workflow.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use common::{OrderEvent, OrderStatus};

use crate::error::{AdapterError, SagaError};
use crate::order_fulfillment::{self, FailurePolicy, FulfillmentSettings, SagaStep};
use crate::run::SagaRun;
use crate::services::order_creation::OrderCreationService;
use crate::services::routing::RouteService;
use crate::services::status::StatusReporter;
use crate::services::warehouse::WarehouseService;
use crate::state::SagaState;

/// Something that fulfills decoded order events.
///
/// This is the seam between the queue consumer and the saga.
#[async_trait]
pub trait OrderProcessor: Send + Sync {
    /// Runs fulfillment for one order.
    ///
    /// An `Err` means the workflow stopped early; it is informational only
    /// and never a reason to redeliver the message.
    async fn process(&self, event: OrderEvent) -> Result<(), SagaError>;
}

/// Orchestrates the execution of order fulfillment sagas.
///
/// The coordinator drives a 3-step saga (order management → route
/// optimizer → warehouse) and reports one status per successful step.
/// There is no compensation: a failed step leaves earlier steps and their
/// status reports in place.
pub struct SagaCoordinator<C, R, W, S>
where
    C: OrderCreationService,
    R: RouteService,
    W: WarehouseService,
    S: StatusReporter,
{
    orders: C,
    routes: R,
    warehouse: W,
    status: S,
    settings: FulfillmentSettings,
}

impl<C, R, W, S> SagaCoordinator<C, R, W, S>
where
    C: OrderCreationService,
    R: RouteService,
    W: WarehouseService,
    S: StatusReporter,
{
    /// Creates a new saga coordinator.
    pub fn new(orders: C, routes: R, warehouse: W, status: S, settings: FulfillmentSettings) -> Self {
        Self {
            orders,
            routes,
            warehouse,
            status,
            settings,
        }
    }

    pub fn settings(&self) -> &FulfillmentSettings {
        &self.settings
    }

    /// Executes an order fulfillment saga for the given event.
    ///
    /// Returns `Err` when order creation or route optimization fails. A
    /// warehouse failure is logged and the run still comes back `Ok`, with
    /// only two completed steps.
    #[tracing::instrument(
        skip(self, event),
        fields(saga_type = order_fulfillment::SAGA_TYPE, order_id = %event.order_id)
    )]
    pub async fn execute_saga(&self, event: &OrderEvent) -> Result<SagaRun, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();
        let order_id = event.order_id;
        let address = event
            .delivery_address
            .as_ref()
            .unwrap_or(&self.settings.fallback_address);

        let mut run = SagaRun::start(order_id);

        // 1. Order management
        let created = self
            .run_step(
                &mut run,
                SagaStep::CreateOrder,
                saga_start,
                self.orders
                    .create_order(order_id, &self.settings.order_details),
            )
            .await?;
        if let Some(created) = created {
            tracing::debug!(cms_status = %created.status, cms_order_id = created.order_id, "order created");
            run.set_cms_order_id(created.order_id);
        }

        // 2. Route optimizer
        let plan = self
            .run_step(
                &mut run,
                SagaStep::OptimizeRoute,
                saga_start,
                self.routes
                    .optimize_route(order_id, address, &self.settings.vehicles),
            )
            .await?;
        if let Some(plan) = plan {
            tracing::debug!(route_id = plan.route_id, stops = plan.route.len(), "route planned");
            run.set_route_id(plan.route_id);
        }

        // 3. Warehouse
        let ack = self
            .run_step(
                &mut run,
                SagaStep::NotifyWarehouse,
                saga_start,
                self.warehouse.notify_warehouse(order_id),
            )
            .await?;
        if let Some(ack) = ack {
            tracing::debug!(%ack, "warehouse acknowledged");
            run.set_warehouse_ack(ack);
        }

        run.finish(SagaState::Completed);

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(
            saga_id = %run.id(),
            state = %run.state(),
            steps = run.completed_steps().len(),
            duration,
            "saga finished"
        );

        Ok(run)
    }

    /// Awaits one step and applies its failure policy.
    ///
    /// `Ok(None)` means the step failed but its policy swallows failures.
    async fn run_step<T, F>(
        &self,
        run: &mut SagaRun,
        step: SagaStep,
        saga_start: Instant,
        call: F,
    ) -> Result<Option<T>, SagaError>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        tracing::info!(step = step.name(), "saga step started");

        match call.await {
            Ok(value) => {
                run.complete_step(step);
                tracing::info!(step = step.name(), "saga step completed");
                self.report(run, step.completion_status()).await;
                Ok(Some(value))
            }
            Err(e) => {
                run.record_failure(step, e.to_string());
                match step.failure_policy() {
                    FailurePolicy::AbortRemaining => {
                        run.finish(SagaState::Aborted);
                        metrics::histogram!("saga_duration_seconds")
                            .record(saga_start.elapsed().as_secs_f64());
                        metrics::counter!("saga_aborted").increment(1);
                        tracing::error!(
                            saga_id = %run.id(),
                            step = step.name(),
                            error = %e,
                            "saga aborted"
                        );
                        Err(SagaError::StepFailed { step, source: e })
                    }
                    FailurePolicy::Swallow => {
                        metrics::counter!("saga_final_step_failures").increment(1);
                        tracing::warn!(
                            saga_id = %run.id(),
                            step = step.name(),
                            error = %e,
                            "saga step failed, continuing"
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Forwards a status transition; failures are logged and dropped.
    async fn report(&self, run: &mut SagaRun, status: OrderStatus) {
        run.record_report(status);
        match self.status.report_status(run.order_id(), status).await {
            Ok(()) => tracing::info!(%status, "order status updated"),
            Err(e) => {
                metrics::counter!("status_report_failures").increment(1);
                tracing::warn!(%status, error = %e, "failed to update order status");
            }
        }
    }
}

#[async_trait]
impl<C, R, W, S> OrderProcessor for SagaCoordinator<C, R, W, S>
where
    C: OrderCreationService,
    R: RouteService,
    W: WarehouseService,
    S: StatusReporter,
{
    async fn process(&self, event: OrderEvent) -> Result<(), SagaError> {
        self.execute_saga(&event).await.map(|_| ())
    }
}
