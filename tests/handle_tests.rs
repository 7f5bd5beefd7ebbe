use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use grabx_cli::app::{ConfirmationBroker, OperationHandle};
use grabx_cli::domain::model::*;
use grabx_cli::engine::progress::{self, ProgressSink};
use grabx_cli::ports::{ConfirmationPort, FetchPort, ProbePort, TranscodePort};
use grabx_cli::*;

/// Writes the target, or blocks until cancelled when `hang` is set
struct Fetcher {
    hang: bool,
}

#[async_trait]
impl FetchPort for Fetcher {
    async fn fetch(
        &self,
        _source: &str,
        _selector: &str,
        output_path: &Path,
        _progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<PathBuf, FetchError> {
        if self.hang {
            fs::write(output_path.with_extension("mp4.part"), b"partial").unwrap();
            token.cancelled().await;
            return Err(FetchError::Cancelled);
        }
        fs::write(output_path, b"fetched").unwrap();
        Ok(output_path.to_path_buf())
    }
}

struct Prober;

#[async_trait]
impl ProbePort for Prober {
    async fn list_formats(&self, _source: &Source) -> Result<Vec<FormatDescriptor>, OperationError> {
        Ok(Vec::new())
    }

    async fn media_info(&self, _path: &Path) -> Result<MediaInfo, OperationError> {
        Ok(MediaInfo::default())
    }
}

struct Transcoder;

#[async_trait]
impl TranscodePort for Transcoder {
    async fn execute(
        &self,
        plan: &TranscodePlan,
        _progress: ProgressSink,
        _token: &CancellationToken,
    ) -> Result<(), OperationError> {
        fs::write(&plan.output, b"encoded").unwrap();
        Ok(())
    }
}

fn start(dir: &Path, hang: bool) -> OperationHandle {
    let broker = Arc::new(ConfirmationBroker::new());
    let orchestrator = Arc::new(
        Orchestrator::new(
            OrchestratorSettings::default(),
            Arc::new(Fetcher { hang }) as Arc<dyn FetchPort>,
            Arc::new(Prober) as Arc<dyn ProbePort>,
            Arc::new(Transcoder) as Arc<dyn TranscodePort>,
            Arc::clone(&broker) as Arc<dyn ConfirmationPort>,
        )
        .with_progress(progress::silent()),
    );
    let request = OperationRequest::new(
        Source::Remote("https://example.com/v".to_string()),
        "Talk",
        dir,
    );
    OperationHandle::spawn(orchestrator, broker, request).unwrap()
}

#[test]
fn conflict_question_is_answered_from_the_main_thread() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Talk.mp4"), b"previous").unwrap();
    let handle = start(dir.path(), false);

    let pending = handle
        .next_confirmation(Duration::from_secs(10))
        .expect("worker should ask about the existing file");
    assert_eq!(
        pending.request,
        ConfirmationRequest::FileConflict {
            path: dir.path().join("Talk.mp4")
        }
    );
    pending.respond(ConfirmationResponse::Rename);

    let result = handle.join();
    assert!(result.success, "{}", result.message);
    assert_eq!(result.final_path, Some(dir.path().join("Talk (1).mp4")));
    assert_eq!(fs::read(dir.path().join("Talk.mp4")).unwrap(), b"previous");
}

#[test]
fn unanswered_question_fails_the_operation() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Talk.mp4"), b"previous").unwrap();
    let handle = start(dir.path(), false);

    let pending = handle.next_confirmation(Duration::from_secs(10)).unwrap();
    drop(pending);

    let result = handle.join();
    assert!(!result.success);
    assert_eq!(fs::read(dir.path().join("Talk.mp4")).unwrap(), b"previous");
}

#[test]
fn cancel_stops_a_hanging_fetch_and_sweeps_partials() {
    let dir = TempDir::new().unwrap();
    let handle = start(dir.path(), true);

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while !dir.path().join("Talk.mp4.part").exists() {
        assert!(std::time::Instant::now() < deadline, "fetch never started");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(handle.cancel());
    assert!(!handle.cancel());

    let result = handle.join();
    assert!(!result.success);
    assert_eq!(result.category, None);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
