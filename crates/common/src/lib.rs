//! Shared kernel for the account, catalog, order and gateway services.
//!
//! - identifiers and money ([`AccountId`], [`ProductId`], [`OrderId`], [`Money`])
//! - listing bounds ([`Pagination`])
//! - the cross-service error model ([`ServiceError`], [`ErrorKind`])
//! - per-call deadlines and the HTTP client used between services
//! - configuration, tracing and database bootstrap for the binaries

pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod http;
pub mod money;
pub mod pagination;
pub mod telemetry;
pub mod types;

pub use config::{LogFormat, ServiceConfig};
pub use deadline::with_deadline;
pub use error::{ErrorKind, Result, ServiceError, StoreError};
pub use http::{ErrorBody, RemoteClient};
pub use money::Money;
pub use pagination::Pagination;
pub use types::{AccountId, OrderId, ProductId};
