//! Output path conflict resolution

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::OperationError;
use crate::domain::model::*;
use crate::ports::ConfirmationPort;
use crate::utils::path::PathUtils;

/// How an existing output file is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Ask the user every time
    #[default]
    Prompt,
    Overwrite,
    Rename,
}

impl FromStr for ConflictPolicy {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prompt" | "ask" => Ok(ConflictPolicy::Prompt),
            "overwrite" | "always" => Ok(ConflictPolicy::Overwrite),
            "rename" => Ok(ConflictPolicy::Rename),
            other => Err(OperationError::InvalidRequest(format!(
                "Invalid conflict policy: {}. Valid policies: prompt, overwrite, rename",
                other
            ))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Prompt => "prompt",
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::Rename => "rename",
        })
    }
}

/// Decides what happens when an output path already exists
pub struct ConflictResolver {
    confirm: Arc<dyn ConfirmationPort>,
    policy: ConflictPolicy,
}

impl ConflictResolver {
    pub fn new(confirm: Arc<dyn ConfirmationPort>, policy: ConflictPolicy) -> Self {
        Self { confirm, policy }
    }

    /// Resolve one exact output path. A free path never involves the user.
    pub async fn resolve(&self, desired: &Path) -> Result<ConflictDecision, OperationError> {
        let exists = desired
            .try_exists()
            .map_err(|e| OperationError::fs(desired, e))?;
        if !exists {
            debug!(path = %desired.display(), "Output path is free");
            return Ok(ConflictDecision::free(desired.to_path_buf()));
        }

        let choice = match self.policy {
            ConflictPolicy::Overwrite => ConfirmationResponse::Overwrite,
            ConflictPolicy::Rename => ConfirmationResponse::Rename,
            ConflictPolicy::Prompt => {
                self.confirm
                    .request(ConfirmationRequest::FileConflict {
                        path: desired.to_path_buf(),
                    })
                    .await?
            }
        };

        match choice {
            ConfirmationResponse::Overwrite => Self::move_aside(desired),
            ConfirmationResponse::Rename => {
                let renamed = PathUtils::unique_variant(desired);
                info!(from = %desired.display(), to = %renamed.display(), "Writing to renamed path");
                Ok(ConflictDecision {
                    final_path: renamed,
                    backup_path: None,
                    outcome: ConflictOutcome::Renamed,
                })
            }
            _ => {
                info!(path = %desired.display(), "User cancelled at file conflict");
                Ok(ConflictDecision {
                    final_path: desired.to_path_buf(),
                    backup_path: None,
                    outcome: ConflictOutcome::Cancelled,
                })
            }
        }
    }

    /// Rename the existing file to `<path>.bak`, replacing any stale backup
    fn move_aside(desired: &Path) -> Result<ConflictDecision, OperationError> {
        let backup = PathUtils::with_suffix(desired, ".bak");
        if backup.exists() {
            std::fs::remove_file(&backup).map_err(|e| OperationError::fs(&backup, e))?;
            debug!(path = %backup.display(), "Removed stale backup");
        }
        std::fs::rename(desired, &backup).map_err(|e| OperationError::fs(desired, e))?;
        info!(path = %desired.display(), backup = %backup.display(), "Existing file moved to backup");

        Ok(ConflictDecision {
            final_path: desired.to_path_buf(),
            backup_path: Some(backup),
            outcome: ConflictOutcome::Overwritten,
        })
    }
}
