//! Downstream capability traits and in-memory implementations for saga steps.

pub mod order_creation;
pub mod routing;
pub mod status;
pub mod warehouse;

pub use order_creation::{
    ClientInfo, InMemoryOrderCreationService, OrderCreated, OrderCreationService,
};
pub use routing::{InMemoryRouteService, RoutePlan, RouteService, RouteStop};
pub use status::{InMemoryStatusReporter, StatusReporter};
pub use warehouse::{InMemoryWarehouseService, WarehouseService};
