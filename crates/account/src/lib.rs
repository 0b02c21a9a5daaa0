//! Account store: owns account identity records and exposes create/get/list.

pub mod client;
pub mod model;
pub mod postgres;
pub mod repository;
pub mod routes;
pub mod service;

pub use client::HttpAccountClient;
pub use model::{Account, CreateAccountRequest};
pub use postgres::PostgresAccountRepository;
pub use repository::{AccountRepository, InMemoryAccountRepository};
pub use service::{AccountApi, AccountService};
