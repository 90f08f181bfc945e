//! Queue consumer error types.

use thiserror::Error;

/// Failures of the broker subscription itself.
///
/// Everything that goes wrong while processing an individual order is
/// settled on the message and never surfaces here.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("broker connection failed: {0}")]
    Connection(#[source] lapin::Error),

    #[error("failed to declare {what}: {source}")]
    Topology {
        what: String,
        #[source]
        source: lapin::Error,
    },

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("subscription closed by the broker")]
    SubscriptionClosed,

    #[error("failed to settle message: {0}")]
    Settle(#[source] lapin::Error),
}

impl ConsumerError {
    pub(crate) fn topology(what: impl Into<String>) -> impl FnOnce(lapin::Error) -> Self {
        let what = what.into();
        move |source| ConsumerError::Topology { what, source }
    }
}
