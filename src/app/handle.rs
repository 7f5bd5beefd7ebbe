// Operation handle - Runs one operation on a dedicated worker thread

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::error;

use crate::app::confirm::{ConfirmationBroker, PendingConfirmation};
use crate::app::orchestrator::Orchestrator;
use crate::domain::errors::OperationError;
use crate::domain::model::{OperationRequest, OperationResult};
use crate::engine::CancellationToken;

/// Main-thread view of a running operation
pub struct OperationHandle {
    token: CancellationToken,
    broker: Arc<ConfirmationBroker>,
    worker: JoinHandle<OperationResult>,
}

impl OperationHandle {
    /// Start `request` on a new thread with its own single-threaded runtime
    ///
    /// `broker` must be the confirmation port the orchestrator was built with.
    pub fn spawn(
        orchestrator: Arc<Orchestrator>,
        broker: Arc<ConfirmationBroker>,
        request: OperationRequest,
    ) -> Result<Self, OperationError> {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let worker = thread::Builder::new()
            .name("grabx-worker".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!(error = %e, "Failed to start worker runtime");
                        return OperationResult {
                            success: false,
                            message: format!("Failed to start worker runtime: {}", e),
                            final_path: None,
                            keep_partial: false,
                            category: None,
                        };
                    }
                };
                runtime.block_on(orchestrator.run(request, worker_token))
            })
            .map_err(|e| OperationError::Worker(e.to_string()))?;

        Ok(Self {
            token,
            broker,
            worker,
        })
    }

    /// Request cancellation; returns `false` if already requested
    pub fn cancel(&self) -> bool {
        self.token.cancel()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait up to `timeout` for the worker to ask something
    pub fn next_confirmation(&self, timeout: Duration) -> Option<PendingConfirmation> {
        self.broker.wait_for_request(timeout)
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the worker returns its result
    pub fn join(self) -> OperationResult {
        match self.worker.join() {
            Ok(result) => result,
            Err(_) => {
                error!("Worker thread panicked");
                OperationResult {
                    success: false,
                    message: "Internal error: the worker thread panicked".to_string(),
                    final_path: None,
                    keep_partial: false,
                    category: None,
                }
            }
        }
    }
}
