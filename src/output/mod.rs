//! Output path ownership: conflict resolution and transactional cleanup

use std::path::{Path, PathBuf};

use crate::domain::errors::OperationError;
use crate::domain::model::ConflictOutcome;

pub mod cleanup;
pub mod conflict;

pub use cleanup::Transaction;
pub use conflict::{ConflictPolicy, ConflictResolver};

/// Pairs the resolver with the run's transaction so every claimed path is recorded
pub struct OutputSession {
    resolver: ConflictResolver,
    transaction: Transaction,
}

impl OutputSession {
    pub fn new(resolver: ConflictResolver) -> Self {
        Self {
            resolver,
            transaction: Transaction::new(),
        }
    }

    /// Consult the resolver for this exact path before anything is written to it
    pub async fn claim(&mut self, desired: &Path) -> Result<PathBuf, OperationError> {
        let decision = self.resolver.resolve(desired).await?;
        if decision.outcome == ConflictOutcome::Cancelled {
            return Err(OperationError::ConflictCancelled);
        }
        self.transaction.record_decision(&decision);
        Ok(decision.final_path)
    }

    pub fn is_handed_over(&self, path: &Path) -> bool {
        self.transaction.is_handed_over(path)
    }

    pub fn transaction(&mut self) -> &mut Transaction {
        &mut self.transaction
    }

    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }
}
