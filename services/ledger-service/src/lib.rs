pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod telemetry;

pub use config::Config;
pub use database::PgLedgerStore;
pub use errors::{ApiError, Result};
