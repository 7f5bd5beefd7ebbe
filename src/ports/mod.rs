// Ports - Interface definitions (contracts) for the external collaborators

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::cancel::CancellationToken;
use crate::engine::progress::ProgressSink;

/// Port for the network media fetcher
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Fetch the streams matched by `selector` into `output_path`
    ///
    /// Returns the local path actually written. `SelectorUnavailable` must be
    /// reported distinctly so the cascade can relax the selector.
    async fn fetch(
        &self,
        source: &str,
        selector: &str,
        output_path: &Path,
        progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<PathBuf, FetchError>;
}

/// Port for media probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// List the formats a source offers (remote formats or local streams)
    async fn list_formats(&self, source: &Source) -> Result<Vec<FormatDescriptor>, OperationError>;

    /// Probe a local file for duration and streams
    async fn media_info(&self, path: &Path) -> Result<MediaInfo, OperationError>;
}

/// Port for the transcode engine
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run the plan, writing to `plan.output`
    ///
    /// Must terminate the underlying process when `token` is cancelled.
    async fn execute(
        &self,
        plan: &TranscodePlan,
        progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<(), OperationError>;
}

/// Port for blocking user confirmation (one outstanding request at a time)
#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    async fn request(
        &self,
        request: ConfirmationRequest,
    ) -> Result<ConfirmationResponse, OperationError>;
}
