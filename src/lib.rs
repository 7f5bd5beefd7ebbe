//! GrabX media grabber library
//!
//! Acquires media from a remote source or a local file, optionally clips a
//! fragment with stream copy and re-encodes it, keeping the output directory
//! consistent on success, failure and cancellation alike.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{Orchestrator, OrchestratorSettings};
pub use config::AppConfig;
pub use domain::errors::{ErrorCategory, FetchError, OperationError};
pub use domain::model::{OperationRequest, OperationResult};
pub use engine::CancellationToken;
pub use error::{GrabXError, GrabXResult};
