//! Lossless time-range extraction

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::OperationError;
use crate::domain::model::{Container, FragmentRange};
use crate::engine::cancel::CancellationToken;
use crate::engine::progress::ProgressSink;
use crate::output::OutputSession;
use crate::planner::fragment::FragmentPlan;
use crate::ports::TranscodePort;
use crate::utils::path::PathUtils;

/// Extracts a fragment by stream copy; never deletes its input
pub struct FragmentClipper {
    transcoder: Arc<dyn TranscodePort>,
}

impl FragmentClipper {
    pub fn new(transcoder: Arc<dyn TranscodePort>) -> Self {
        Self { transcoder }
    }

    /// Clip `input` to `range`, writing `<stem> [<range>].<ext>` into `dir`
    #[allow(clippy::too_many_arguments)]
    pub async fn clip(
        &self,
        input: &Path,
        dir: &Path,
        stem: &str,
        range: &FragmentRange,
        total_duration: Option<f64>,
        session: &mut OutputSession,
        progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<PathBuf, OperationError> {
        let fragment = FragmentPlan::compute(range, total_duration)?;
        let container = PathUtils::extension(input)
            .and_then(|ext| Container::from_extension(&ext))
            .unwrap_or(Container::Mkv);

        let output = session.claim(&clip_target(dir, stem, range, container)).await?;
        session.transaction().track_output(&output);

        info!(
            input = %input.display(),
            output = %output.display(),
            start = fragment.start,
            duration = fragment.duration,
            "Clipping fragment"
        );
        let plan = fragment.to_transcode_plan(input.to_path_buf(), output.clone(), container);
        self.transcoder.execute(&plan, progress, token).await?;
        Ok(output)
    }
}

/// `<dir>/<stem> [<start>-<end>].<ext>`
pub fn clip_target(dir: &Path, stem: &str, range: &FragmentRange, container: Container) -> PathBuf {
    let start = range
        .start
        .map(|t| t.format_for_filename())
        .unwrap_or_else(|| "00-00-00".to_string());
    let end = range
        .end
        .map(|t| t.format_for_filename())
        .unwrap_or_else(|| "end".to_string());
    dir.join(format!(
        "{} [{}-{}].{}",
        stem,
        start,
        end,
        container.extension()
    ))
}
