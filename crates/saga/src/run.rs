//! In-memory record of one saga execution.

use common::{OrderId, OrderStatus, SagaId};

use crate::order_fulfillment::SagaStep;
use crate::state::SagaState;

/// Tracks one saga execution from start to finish.
///
/// Lives only as long as the message that triggered it; nothing is persisted.
#[derive(Debug, Clone)]
pub struct SagaRun {
    id: SagaId,
    order_id: OrderId,
    state: SagaState,
    completed_steps: Vec<SagaStep>,
    reported: Vec<OrderStatus>,
    /// Order number echoed back by the order management system.
    cms_order_id: Option<i64>,
    /// Route planned by the route optimizer.
    route_id: Option<i64>,
    /// Acknowledgment text from the warehouse.
    warehouse_ack: Option<String>,
    /// Why the saga stopped short, if it did.
    failure: Option<(SagaStep, String)>,
}

impl SagaRun {
    pub(crate) fn start(order_id: OrderId) -> Self {
        Self {
            id: SagaId::new(),
            order_id,
            state: SagaState::Running,
            completed_steps: Vec::new(),
            reported: Vec::new(),
            cms_order_id: None,
            route_id: None,
            warehouse_ack: None,
            failure: None,
        }
    }

    pub(crate) fn complete_step(&mut self, step: SagaStep) {
        self.completed_steps.push(step);
    }

    pub(crate) fn record_report(&mut self, status: OrderStatus) {
        self.reported.push(status);
    }

    pub(crate) fn set_cms_order_id(&mut self, id: i64) {
        self.cms_order_id = Some(id);
    }

    pub(crate) fn set_route_id(&mut self, id: i64) {
        self.route_id = Some(id);
    }

    pub(crate) fn set_warehouse_ack(&mut self, ack: String) {
        self.warehouse_ack = Some(ack);
    }

    pub(crate) fn record_failure(&mut self, step: SagaStep, reason: String) {
        self.failure = Some((step, reason));
    }

    pub(crate) fn finish(&mut self, state: SagaState) {
        debug_assert!(state.is_terminal());
        self.state = state;
    }

    pub fn id(&self) -> SagaId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Steps that succeeded, in the order they ran.
    pub fn completed_steps(&self) -> &[SagaStep] {
        &self.completed_steps
    }

    /// Statuses handed to the reporter, whether or not delivery succeeded.
    pub fn reported_statuses(&self) -> &[OrderStatus] {
        &self.reported
    }

    pub fn cms_order_id(&self) -> Option<i64> {
        self.cms_order_id
    }

    pub fn route_id(&self) -> Option<i64> {
        self.route_id
    }

    pub fn warehouse_ack(&self) -> Option<&str> {
        self.warehouse_ack.as_deref()
    }

    /// The failed step and its error message.
    pub fn failure(&self) -> Option<(SagaStep, &str)> {
        self.failure
            .as_ref()
            .map(|(step, reason)| (*step, reason.as_str()))
    }
}
