// Orchestrator - Sequences one acquisition/transcode operation

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::errors::OperationError;
use crate::domain::model::*;
use crate::domain::rules::{CompatibilityReport, CompatibilityStatus, CompatibilityValidator};
use crate::engine::progress::{self, ProgressEvent, ProgressPhase, ProgressSink};
use crate::engine::{CancellationToken, FragmentClipper, SelectorCascade};
use crate::output::cleanup::files_with_base;
use crate::output::{ConflictPolicy, ConflictResolver, OutputSession};
use crate::planner::transcode::{PlannerSettings, TranscodePlanner};
use crate::ports::{ConfirmationPort, FetchPort, ProbePort, TranscodePort};
use crate::utils::path::PathUtils;

pub mod naming;

/// Settings fixed at construction time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrchestratorSettings {
    pub conflict_policy: ConflictPolicy,
    pub planner: PlannerSettings,
}

/// Operation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Resolving,
    Fetching,
    Clipping,
    Transcoding,
    Cleanup,
    Done,
    Failed,
    Cancelled,
}

impl OperationState {
    fn progress_phase(self) -> ProgressPhase {
        match self {
            OperationState::Resolving => ProgressPhase::Resolving,
            OperationState::Fetching => ProgressPhase::Fetching,
            OperationState::Clipping => ProgressPhase::Clipping,
            OperationState::Transcoding => ProgressPhase::Transcoding,
            OperationState::Cleanup => ProgressPhase::Cleanup,
            OperationState::Done => ProgressPhase::Complete,
            OperationState::Failed => ProgressPhase::Failed,
            OperationState::Cancelled => ProgressPhase::Cancelled,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Mutable state of one run, owned by the worker
struct Run {
    state: OperationState,
    session: OutputSession,
    /// File the next phase reads
    working: Option<PathBuf>,
    /// The fetch phase completed
    fetched: bool,
    /// Files that were on disk before this run and are never removed by it
    foreign: Vec<PathBuf>,
}

/// Acquisition/transcode state machine
pub struct Orchestrator {
    settings: OrchestratorSettings,
    prober: Arc<dyn ProbePort>,
    transcoder: Arc<dyn TranscodePort>,
    confirm: Arc<dyn ConfirmationPort>,
    cascade: SelectorCascade,
    clipper: FragmentClipper,
    planner: TranscodePlanner,
    progress: ProgressSink,
}

impl Orchestrator {
    /// Create the orchestrator with injected collaborators
    pub fn new(
        settings: OrchestratorSettings,
        fetcher: Arc<dyn FetchPort>,
        prober: Arc<dyn ProbePort>,
        transcoder: Arc<dyn TranscodePort>,
        confirm: Arc<dyn ConfirmationPort>,
    ) -> Self {
        Self {
            settings,
            cascade: SelectorCascade::new(fetcher, Arc::clone(&prober), Arc::clone(&confirm)),
            clipper: FragmentClipper::new(Arc::clone(&transcoder)),
            planner: TranscodePlanner::new(settings.planner),
            prober,
            transcoder,
            confirm,
            progress: progress::logging(),
        }
    }

    /// Replace the default tracing progress sink
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = sink;
        self
    }

    /// Run one operation to completion; the filesystem is consistent when this returns
    pub async fn run(&self, request: OperationRequest, token: CancellationToken) -> OperationResult {
        info!(source = %request.source, title = %request.title, "Starting operation");
        let mut run = Run {
            state: OperationState::Resolving,
            session: OutputSession::new(ConflictResolver::new(
                Arc::clone(&self.confirm),
                self.settings.conflict_policy,
            )),
            working: None,
            fetched: false,
            foreign: Vec::new(),
        };

        let outcome = self.drive(&request, &token, &mut run).await;
        self.finish(&request, run, outcome).await
    }

    async fn drive(
        &self,
        request: &OperationRequest,
        token: &CancellationToken,
        run: &mut Run,
    ) -> Result<PathBuf, OperationError> {
        request.validate()?;
        let compatibility = self.check_compatibility(request)?;
        token.check()?;

        // RESOLVING
        self.enter(run, OperationState::Resolving, "Resolving output path");
        std::fs::create_dir_all(&request.output_dir)
            .map_err(|e| OperationError::fs(&request.output_dir, e))?;
        let fetch_target = match &request.source {
            Source::Remote(_) => run.session.claim(&naming::download_target(request)).await?,
            Source::Local(path) => {
                if !path.is_file() {
                    return Err(OperationError::InvalidRequest(format!(
                        "Local file not found: {}",
                        path.display()
                    )));
                }
                path.clone()
            }
        };
        token.check()?;

        // FETCHING
        self.enter(run, OperationState::Fetching, "Acquiring source");
        let existing = if request.source.is_remote() {
            run.session.transaction().track_output(&fetch_target);
            files_with_base(&request.output_dir, &PathUtils::stem(&fetch_target))
        } else {
            Vec::new()
        };
        let fetched = self
            .cascade
            .acquire(request, &fetch_target, self.progress.clone(), token)
            .await?;
        if request.source.is_remote() && fetched != fetch_target {
            // nothing landed at the claimed path; give back whatever it displaced
            run.session.transaction().discard(&fetch_target)?;
            if existing.contains(&fetched) {
                warn!(path = %fetched.display(), "Fetcher reused a file that was already present, leaving it untouched");
                run.foreign.push(fetched.clone());
            } else {
                debug!(expected = %fetch_target.display(), actual = %fetched.display(), "Fetcher chose another name");
                run.session.transaction().track_output(&fetched);
            }
        }
        if request.recode.keep_original && !Self::is_foreign(request, run, &fetched) {
            run.session.transaction().hand_over(&fetched);
        }
        run.working = Some(fetched);
        run.fetched = true;
        token.check()?;

        // CLIPPING
        if let Some(range) = request.fragment.filter(|f| !f.is_empty()) {
            self.enter(run, OperationState::Clipping, "Extracting fragment");
            let input = self.working(run)?;
            let total = match self.prober.media_info(&input).await {
                Ok(info) => info.duration,
                Err(err) if range.end.is_some() => {
                    warn!(error = %err, "Probe failed, clipping with the explicit end time");
                    None
                }
                Err(err) => return Err(err),
            };
            let clipped = self
                .clipper
                .clip(
                    &input,
                    &request.output_dir,
                    &naming::derived_stem(request, &input),
                    &range,
                    total,
                    &mut run.session,
                    progress::in_phase(self.progress.clone(), ProgressPhase::Clipping),
                    token,
                )
                .await?;
            self.discard_original(request, run, &input)?;
            run.working = Some(clipped);
            token.check()?;
        }

        // TRANSCODING
        if let Some(report) = compatibility {
            self.enter(run, OperationState::Transcoding, "Re-encoding");
            let input = self.working(run)?;
            let source_info = match self.prober.media_info(&input).await {
                Ok(info) => Some(info),
                Err(err) => {
                    warn!(error = %err, "Probe failed, planning without source geometry");
                    None
                }
            };

            let final_path = run
                .session
                .claim(&naming::transcode_target(request, &input, request.target_container()))
                .await?;
            let temp = PathUtils::with_suffix(&final_path, ".temp");
            if temp.exists() {
                std::fs::remove_file(&temp).map_err(|e| OperationError::fs(&temp, e))?;
            }
            run.session.transaction().track_temporary(&temp);

            let plan = self.planner.plan(
                request,
                &report,
                source_info.as_ref(),
                input.clone(),
                temp.clone(),
            )?;
            self.transcoder
                .execute(&plan, self.progress.clone(), token)
                .await?;
            token.check()?;

            std::fs::rename(&temp, &final_path).map_err(|e| OperationError::fs(&temp, e))?;
            run.session.transaction().forget_temporary(&temp);
            run.session.transaction().track_output(&final_path);
            info!(path = %final_path.display(), "Transcode output in place");

            self.discard_original(request, run, &input)?;
            run.working = Some(final_path);
        }

        self.working(run)
    }

    /// Validate the recode options before any process is spawned
    fn check_compatibility(
        &self,
        request: &OperationRequest,
    ) -> Result<Option<CompatibilityReport>, OperationError> {
        if !request.wants_transcode() {
            return Ok(None);
        }
        let report = CompatibilityValidator::validate(
            request.target_container(),
            request.video_choice(),
            request.audio_choice(),
            request.original_video_codec(),
            request.original_audio_codec(),
        );
        match report.status {
            CompatibilityStatus::Error => return Err(OperationError::Compatibility(report.message)),
            CompatibilityStatus::Warning => warn!(message = %report.message, "Compatibility warning"),
            CompatibilityStatus::Valid => debug!("Compatibility check passed"),
        }
        Ok(Some(report))
    }

    fn working(&self, run: &Run) -> Result<PathBuf, OperationError> {
        run.working
            .clone()
            .ok_or_else(|| OperationError::InvalidRequest("no working file".to_string()))
    }

    /// Files this run must never delete: the local source and files that predate the run
    fn is_foreign(request: &OperationRequest, run: &Run, path: &Path) -> bool {
        request.source.local_path() == Some(path) || run.foreign.iter().any(|p| p == path)
    }

    /// Hand an intermediate file to the user, or delete it and restore what it displaced
    fn discard_original(
        &self,
        request: &OperationRequest,
        run: &mut Run,
        path: &Path,
    ) -> Result<(), OperationError> {
        if Self::is_foreign(request, run, path) {
            return Ok(());
        }
        if request.recode.keep_original {
            run.session.transaction().hand_over(path);
            debug!(path = %path.display(), "Keeping intermediate file");
            return Ok(());
        }
        run.session.transaction().discard(path)?;
        debug!(path = %path.display(), "Removed intermediate file");
        Ok(())
    }

    fn enter(&self, run: &mut Run, state: OperationState, detail: &str) {
        debug!(from = %run.state, to = %state, "State transition");
        run.state = state;
        (self.progress)(ProgressEvent::phase(state.progress_phase(), detail));
    }

    async fn finish(
        &self,
        request: &OperationRequest,
        mut run: Run,
        outcome: Result<PathBuf, OperationError>,
    ) -> OperationResult {
        self.enter(&mut run, OperationState::Cleanup, "Cleaning up");
        let keep = match &outcome {
            Err(err) => self.offer_keep(request, &run, err).await,
            Ok(_) => None,
        };
        let Run { session, .. } = run;
        let transaction = session.into_transaction();

        match outcome {
            Ok(path) => {
                let mut result = OperationResult::succeeded(path);
                if let Err(err) = transaction.commit() {
                    warn!(error = %err, "Cleanup after success was incomplete");
                    result.message = format!("{} (cleanup incomplete: {})", result.message, err);
                }
                info!(message = %result.message, "Operation complete");
                (self.progress)(ProgressEvent::phase(ProgressPhase::Complete, result.message.clone()));
                result
            }
            Err(err) => {
                let rollback = transaction.rollback(keep.as_deref());
                let state = if err.is_quiet() {
                    info!(reason = %err, "Operation cancelled");
                    OperationState::Cancelled
                } else {
                    error!(error = %err, "Operation failed");
                    OperationState::Failed
                };

                let mut result = if err.is_quiet() {
                    OperationResult::quiet(err.to_string())
                } else {
                    OperationResult {
                        success: false,
                        message: err.user_message(),
                        final_path: None,
                        keep_partial: false,
                        category: (!err.is_configuration()).then(|| err.category()),
                    }
                };
                if let Some(kept) = keep {
                    result.message = format!("{}; kept {}", result.message, kept.display());
                    result.final_path = Some(kept);
                    result.keep_partial = true;
                }
                if let Err(rollback_err) = rollback {
                    result.message = format!("{} (cleanup incomplete: {})", result.message, rollback_err);
                }
                (self.progress)(ProgressEvent::phase(state.progress_phase(), result.message.clone()));
                result
            }
        }
    }

    /// After a successful fetch, let the user keep the last good intermediate file
    async fn offer_keep(
        &self,
        request: &OperationRequest,
        run: &Run,
        err: &OperationError,
    ) -> Option<PathBuf> {
        if !run.fetched || matches!(err, OperationError::ConfirmationUnavailable(_)) {
            return None;
        }
        let working = run.working.as_ref()?;
        if Self::is_foreign(request, run, working) || !working.exists() {
            return None;
        }
        if run.session.is_handed_over(working) {
            return Some(working.clone());
        }

        let question = ConfirmationRequest::KeepOriginal {
            path: working.clone(),
            reason: err.to_string(),
        };
        match self.confirm.request(question).await {
            Ok(ConfirmationResponse::Yes) => {
                info!(path = %working.display(), "Keeping already-fetched file");
                Some(working.clone())
            }
            Ok(_) => None,
            Err(confirm_err) => {
                warn!(error = %confirm_err, "Keep-original question went unanswered");
                None
            }
        }
    }
}
