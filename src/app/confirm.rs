// Confirmation rendezvous between the worker thread and the main thread

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::errors::OperationError;
use crate::domain::model::{ConfirmationRequest, ConfirmationResponse};
use crate::output::ConflictPolicy;
use crate::ports::ConfirmationPort;

struct Pending {
    request: ConfirmationRequest,
    reply: oneshot::Sender<ConfirmationResponse>,
}

#[derive(Default)]
struct Slot {
    /// Published by the worker, taken by the main thread
    pending: Option<Pending>,
    /// A worker is waiting for an answer
    outstanding: bool,
}

/// Single-slot synchronous rendezvous
///
/// The worker publishes one request and suspends until the main thread
/// answers it. A second request while one is outstanding is rejected.
#[derive(Default)]
pub struct ConfirmationBroker {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl ConfirmationBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Main thread: take the published request, if any, without waiting
    pub fn try_take(&self) -> Option<PendingConfirmation> {
        self.lock().pending.take().map(PendingConfirmation::from_pending)
    }

    /// Main thread: wait up to `timeout` for the worker to publish a request
    pub fn wait_for_request(&self, timeout: Duration) -> Option<PendingConfirmation> {
        let guard = self.lock();
        let (mut guard, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |slot| slot.pending.is_none())
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.pending.take().map(PendingConfirmation::from_pending)
    }

    /// A request is published or being answered
    pub fn is_outstanding(&self) -> bool {
        self.lock().outstanding
    }

    fn finish(&self) {
        let mut slot = self.lock();
        slot.pending = None;
        slot.outstanding = false;
    }
}

/// Clears the slot however the worker's wait ends
struct OutstandingGuard<'a>(&'a ConfirmationBroker);

impl Drop for OutstandingGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

#[async_trait]
impl ConfirmationPort for ConfirmationBroker {
    async fn request(
        &self,
        request: ConfirmationRequest,
    ) -> Result<ConfirmationResponse, OperationError> {
        let (reply, response) = oneshot::channel();
        {
            let mut slot = self.lock();
            if slot.outstanding {
                return Err(OperationError::ConfirmationUnavailable(
                    "another confirmation is already pending".to_string(),
                ));
            }
            debug!(?request, "Publishing confirmation request");
            slot.pending = Some(Pending { request, reply });
            slot.outstanding = true;
        }
        self.ready.notify_all();

        let _guard = OutstandingGuard(self);
        response.await.map_err(|_| {
            warn!("Confirmation dropped without an answer");
            OperationError::ConfirmationUnavailable("the prompt was closed without an answer".to_string())
        })
    }
}

/// A request taken off the slot; answer it exactly once
pub struct PendingConfirmation {
    pub request: ConfirmationRequest,
    responder: Responder,
}

impl PendingConfirmation {
    fn from_pending(pending: Pending) -> Self {
        Self {
            request: pending.request,
            responder: Responder(pending.reply),
        }
    }

    pub fn respond(self, response: ConfirmationResponse) {
        self.responder.send(response);
    }

    pub fn into_parts(self) -> (ConfirmationRequest, Responder) {
        (self.request, self.responder)
    }
}

/// Response half; dropping it unanswered fails the worker's request
pub struct Responder(oneshot::Sender<ConfirmationResponse>);

impl Responder {
    pub fn send(self, response: ConfirmationResponse) {
        if self.0.send(response).is_err() {
            debug!("Worker stopped waiting before the answer arrived");
        }
    }
}

/// Non-interactive answers, for `--yes` and unattended runs
pub struct AutoConfirm {
    conflict: ConflictPolicy,
    accept: bool,
}

impl AutoConfirm {
    /// `accept` answers compromise and keep-original questions with yes
    pub fn new(conflict: ConflictPolicy, accept: bool) -> Self {
        Self { conflict, accept }
    }

    pub fn answer(&self, request: &ConfirmationRequest) -> ConfirmationResponse {
        match request {
            ConfirmationRequest::FileConflict { .. } => match self.conflict {
                ConflictPolicy::Overwrite => ConfirmationResponse::Overwrite,
                ConflictPolicy::Rename => ConfirmationResponse::Rename,
                ConflictPolicy::Prompt if self.accept => ConfirmationResponse::Rename,
                ConflictPolicy::Prompt => ConfirmationResponse::Cancel,
            },
            ConfirmationRequest::AcceptCompromise { .. } | ConfirmationRequest::KeepOriginal { .. } => {
                if self.accept {
                    ConfirmationResponse::Yes
                } else {
                    ConfirmationResponse::No
                }
            }
        }
    }
}

#[async_trait]
impl ConfirmationPort for AutoConfirm {
    async fn request(
        &self,
        request: ConfirmationRequest,
    ) -> Result<ConfirmationResponse, OperationError> {
        let answer = self.answer(&request);
        debug!(?request, ?answer, "Answered automatically");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn conflict() -> ConfirmationRequest {
        ConfirmationRequest::FileConflict {
            path: PathBuf::from("/tmp/a.mp4"),
        }
    }

    #[test]
    fn rendezvous_round_trip() {
        let broker = Arc::new(ConfirmationBroker::new());
        let worker_broker = Arc::clone(&broker);
        let worker = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(worker_broker.request(conflict()))
        });

        let pending = broker
            .wait_for_request(Duration::from_secs(5))
            .expect("worker should publish");
        assert_eq!(pending.request, conflict());
        pending.respond(ConfirmationResponse::Rename);

        let answer = worker.join().unwrap().unwrap();
        assert_eq!(answer, ConfirmationResponse::Rename);
        assert!(!broker.is_outstanding());
    }

    #[test]
    fn dropped_responder_is_unavailable() {
        let broker = Arc::new(ConfirmationBroker::new());
        let worker_broker = Arc::clone(&broker);
        let worker = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(worker_broker.request(conflict()))
        });

        let pending = broker.wait_for_request(Duration::from_secs(5)).unwrap();
        drop(pending);
        assert!(matches!(
            worker.join().unwrap(),
            Err(OperationError::ConfirmationUnavailable(_))
        ));
    }

    #[test]
    fn second_request_is_rejected_while_outstanding() {
        let broker = Arc::new(ConfirmationBroker::new());
        let worker_broker = Arc::clone(&broker);
        let worker = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(worker_broker.request(conflict()))
        });
        let pending = broker.wait_for_request(Duration::from_secs(5)).unwrap();

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let second = rt.block_on(broker.request(conflict()));
        assert!(matches!(second, Err(OperationError::ConfirmationUnavailable(_))));

        pending.respond(ConfirmationResponse::Cancel);
        assert_eq!(worker.join().unwrap().unwrap(), ConfirmationResponse::Cancel);
    }

    #[test]
    fn wait_times_out_without_request() {
        let broker = ConfirmationBroker::new();
        assert!(broker.wait_for_request(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn auto_confirm_follows_policy() {
        let auto = AutoConfirm::new(ConflictPolicy::Overwrite, false);
        assert_eq!(auto.answer(&conflict()), ConfirmationResponse::Overwrite);
        assert_eq!(
            auto.answer(&ConfirmationRequest::AcceptCompromise {
                description: "x".into()
            }),
            ConfirmationResponse::No
        );
    }
}
