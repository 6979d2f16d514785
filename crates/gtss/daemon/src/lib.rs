//! GTSS daemon library
//!
//! HTTP surface over the entity registry:
//! - REST handlers with request validation
//! - Configuration loading
//! - Store construction and server lifecycle

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
pub use storage::open_store;
