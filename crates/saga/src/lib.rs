//! Saga pattern implementation for order fulfillment.
//!
//! The order fulfillment saga drives one order through three downstream
//! systems:
//! 1. Create the order in the order management system
//! 2. Optimize a delivery route
//! 3. Hand the package to the warehouse
//!
//! Every successful step reports a status to the order service. Failures of
//! steps 1 and 2 abort the rest of the saga; a failure of step 3 is logged
//! and swallowed. Nothing is rolled back.

pub mod coordinator;
pub mod error;
pub mod order_fulfillment;
pub mod run;
pub mod services;
pub mod state;

pub use coordinator::{OrderProcessor, SagaCoordinator};
pub use error::{AdapterError, SagaError};
pub use order_fulfillment::{FailurePolicy, FulfillmentSettings, SagaStep};
pub use run::SagaRun;
pub use services::{
    ClientInfo, InMemoryOrderCreationService, InMemoryRouteService, InMemoryStatusReporter,
    InMemoryWarehouseService, OrderCreated, OrderCreationService, RoutePlan, RouteService,
    RouteStop, StatusReporter, WarehouseService,
};
pub use state::SagaState;
