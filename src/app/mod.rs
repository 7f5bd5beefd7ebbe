// Application layer - Operation orchestration and wiring

pub mod confirm;
pub mod container;
pub mod handle;
pub mod orchestrator;

// Re-export the application surface
pub use confirm::{AutoConfirm, ConfirmationBroker, PendingConfirmation};
pub use container::{AppContainer, DefaultAppContainer};
pub use handle::OperationHandle;
pub use orchestrator::{Orchestrator, OrchestratorSettings};
