//! Drives the fetcher through the selector cascade

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::{FetchError, OperationError};
use crate::domain::model::*;
use crate::engine::cancel::CancellationToken;
use crate::engine::progress::ProgressSink;
use crate::planner::selector::{CascadeStep, SelectorPlanner};
use crate::ports::{ConfirmationPort, FetchPort, ProbePort};

/// Shown when the alternative cannot be described
const GENERIC_ALTERNATIVE: &str = "the best format the source offers";

/// Materializes a local source file for a request
pub struct SelectorCascade {
    fetcher: Arc<dyn FetchPort>,
    prober: Arc<dyn ProbePort>,
    confirm: Arc<dyn ConfirmationPort>,
}

impl SelectorCascade {
    pub fn new(
        fetcher: Arc<dyn FetchPort>,
        prober: Arc<dyn ProbePort>,
        confirm: Arc<dyn ConfirmationPort>,
    ) -> Self {
        Self {
            fetcher,
            prober,
            confirm,
        }
    }

    /// Fetch the request's source into `output_path`, relaxing the selector
    /// each time the fetcher reports it unavailable
    ///
    /// Local sources are returned as-is.
    pub async fn acquire(
        &self,
        request: &OperationRequest,
        output_path: &Path,
        progress: ProgressSink,
        token: &CancellationToken,
    ) -> Result<PathBuf, OperationError> {
        let url = match &request.source {
            Source::Local(path) => {
                debug!(path = %path.display(), "Local source, nothing to fetch");
                return Ok(path.clone());
            }
            Source::Remote(url) => url.as_str(),
        };

        for step in SelectorPlanner::build_cascade(request) {
            token.check()?;
            let selector = match step {
                CascadeStep::Negotiate => {
                    self.negotiate(request).await?;
                    continue;
                }
                CascadeStep::Fetch(selector) => selector,
            };

            info!(tier = %selector.tier, selector = %selector.expression, "Fetching");
            match self
                .fetcher
                .fetch(url, &selector.expression, output_path, progress.clone(), token)
                .await
            {
                Ok(path) => {
                    info!(tier = %selector.tier, path = %path.display(), "Fetch complete");
                    return Ok(path);
                }
                Err(FetchError::SelectorUnavailable { .. }) => {
                    warn!(tier = %selector.tier, selector = %selector.expression, "Selector unavailable, relaxing");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(OperationError::SelectorExhausted)
    }

    /// Ask the user whether the best available alternative is acceptable
    async fn negotiate(&self, request: &OperationRequest) -> Result<(), OperationError> {
        let description = match self.prober.list_formats(&request.source).await {
            Ok(formats) => SelectorPlanner::describe_best_alternative(&formats, request.mode),
            Err(err) => {
                warn!(error = %err, "Could not list formats for the compromise description");
                None
            }
        }
        .unwrap_or_else(|| GENERIC_ALTERNATIVE.to_string());

        let answer = self
            .confirm
            .request(ConfirmationRequest::AcceptCompromise {
                description: description.clone(),
            })
            .await?;

        match answer {
            ConfirmationResponse::Yes | ConfirmationResponse::Overwrite => {
                info!(%description, "Compromise accepted");
                Ok(())
            }
            _ => {
                info!("Compromise declined");
                Err(OperationError::SelectorExhausted)
            }
        }
    }
}
