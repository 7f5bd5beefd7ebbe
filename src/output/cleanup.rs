//! Transactional bookkeeping of every file an operation touches

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::errors::OperationError;
use crate::domain::model::ConflictDecision;
use crate::utils::path::PathUtils;

/// Suffixes left behind by interrupted fetches and encodes
const PARTIAL_SUFFIXES: [&str; 3] = [".part", ".ytdl", ".temp"];
const FRAGMENT_MARKER: &str = ".part-Frag";

/// An existing file moved aside before being overwritten
#[derive(Debug, Clone, PartialEq)]
struct Backup {
    original: PathBuf,
    backup: PathBuf,
}

/// Ledger of backups, temporaries and outputs created during one run
#[derive(Debug, Default)]
pub struct Transaction {
    backups: Vec<Backup>,
    temporaries: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    /// Files given to the user mid-run; never removed and never restored over
    handed_over: Vec<PathBuf>,
    /// (directory, stem) pairs swept for partial artifacts
    bases: Vec<(PathBuf, String)>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the backup and base name a conflict decision produced
    pub fn record_decision(&mut self, decision: &ConflictDecision) {
        if let Some(backup) = &decision.backup_path {
            self.backups.push(Backup {
                original: decision.final_path.clone(),
                backup: backup.clone(),
            });
        }
        if let Some(dir) = decision.final_path.parent() {
            let base = (dir.to_path_buf(), PathUtils::stem(&decision.final_path));
            if !self.bases.contains(&base) {
                self.bases.push(base);
            }
        }
    }

    pub fn track_temporary(&mut self, path: &Path) {
        if !self.temporaries.iter().any(|p| p == path) {
            self.temporaries.push(path.to_path_buf());
        }
    }

    pub fn forget_temporary(&mut self, path: &Path) {
        self.temporaries.retain(|p| p != path);
    }

    /// A file this run wrote at a user-visible path
    pub fn track_output(&mut self, path: &Path) {
        if !self.outputs.iter().any(|p| p == path) {
            self.outputs.push(path.to_path_buf());
        }
    }

    /// Output deleted on purpose, or handed to the user
    pub fn forget_output(&mut self, path: &Path) {
        self.outputs.retain(|p| p != path);
    }

    /// The user keeps `path` whatever happens later
    pub fn hand_over(&mut self, path: &Path) {
        self.forget_output(path);
        if !self.handed_over.iter().any(|p| p == path) {
            self.handed_over.push(path.to_path_buf());
        }
    }

    pub fn is_handed_over(&self, path: &Path) -> bool {
        self.handed_over.iter().any(|p| p == path)
    }

    /// Delete an intermediate output now; a file it displaced comes back
    pub fn discard(&mut self, path: &Path) -> Result<(), OperationError> {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(OperationError::fs(path, e)),
        }
        self.forget_output(path);

        if let Some(index) = self.backups.iter().position(|b| b.original == path) {
            let entry = self.backups.remove(index);
            std::fs::rename(&entry.backup, &entry.original)
                .map_err(|e| OperationError::fs(&entry.backup, e))?;
            info!(path = %entry.original.display(), "Restored original displaced by an intermediate file");
        }
        Ok(())
    }

    pub fn has_backups(&self) -> bool {
        !self.backups.is_empty()
    }

    /// Success: drop every backup and temporary
    pub fn commit(self) -> Result<(), OperationError> {
        let mut first_error = None;
        for temp in &self.temporaries {
            remove_if_exists(temp, &mut first_error);
        }
        for entry in &self.backups {
            remove_if_exists(&entry.backup, &mut first_error);
            debug!(backup = %entry.backup.display(), "Backup discarded");
        }
        self.sweep_partials();
        first_error.map_or(Ok(()), Err)
    }

    /// Failure: delete what this run created and restore every backup
    ///
    /// `keep` names a file the user chose to retain; it survives and any
    /// backup of that same path is discarded instead of restored.
    pub fn rollback(self, keep: Option<&Path>) -> Result<(), OperationError> {
        let mut first_error = None;
        let kept = |p: &Path| {
            keep.map(|k| k == p).unwrap_or(false) || self.handed_over.iter().any(|h| h == p)
        };

        for temp in &self.temporaries {
            remove_if_exists(temp, &mut first_error);
        }
        for output in self.outputs.iter().filter(|p| !kept(p.as_path())) {
            remove_if_exists(output, &mut first_error);
            debug!(path = %output.display(), "Removed output of failed run");
        }

        for entry in self.backups.iter().rev() {
            if kept(entry.original.as_path()) {
                remove_if_exists(&entry.backup, &mut first_error);
                continue;
            }
            if entry.original.exists() {
                remove_if_exists(&entry.original, &mut first_error);
            }
            match std::fs::rename(&entry.backup, &entry.original) {
                Ok(()) => info!(path = %entry.original.display(), "Restored original from backup"),
                Err(e) => {
                    warn!(backup = %entry.backup.display(), error = %e, "Failed to restore backup");
                    first_error.get_or_insert(OperationError::fs(&entry.backup, e));
                }
            }
        }

        self.sweep_partials();
        first_error.map_or(Ok(()), Err)
    }

    /// Delete stray partial artifacts that share a base name with this run's outputs
    fn sweep_partials(&self) {
        for (dir, stem) in &self.bases {
            for path in partial_artifacts(dir, stem) {
                match std::fs::remove_file(&path) {
                    Ok(()) => debug!(path = %path.display(), "Removed partial artifact"),
                    Err(e) => warn!(path = %path.display(), error = %e, "Could not remove partial artifact"),
                }
            }
        }
    }
}

/// Files directly in `dir` that look like leftovers of an interrupted write of `stem`
pub fn partial_artifacts(dir: &Path, stem: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            has_base(&name, stem)
                && (PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) || name.contains(FRAGMENT_MARKER))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Files directly in `dir` named `<stem>.<anything>`
pub fn files_with_base(dir: &Path, stem: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_base(&entry.file_name().to_string_lossy(), stem))
        .map(|entry| entry.into_path())
        .collect()
}

/// `name` is `<stem>.` followed by at least one character
fn has_base(name: &str, stem: &str) -> bool {
    name.strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('.'))
        .map_or(false, |rest| !rest.is_empty())
}

fn remove_if_exists(path: &Path, first_error: &mut Option<OperationError>) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove file");
            first_error.get_or_insert(OperationError::fs(path, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ConflictOutcome;
    use std::fs;

    fn overwritten(dir: &Path, name: &str) -> ConflictDecision {
        let path = dir.join(name);
        let backup = PathUtils::with_suffix(&path, ".bak");
        fs::rename(&path, &backup).unwrap();
        ConflictDecision {
            final_path: path,
            backup_path: Some(backup),
            outcome: ConflictOutcome::Overwritten,
        }
    }

    #[test]
    fn rollback_restores_backup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"old").unwrap();
        let decision = overwritten(dir.path(), "a.mp4");

        let mut tx = Transaction::new();
        tx.record_decision(&decision);
        fs::write(&decision.final_path, b"new partial").unwrap();
        tx.track_output(&decision.final_path);
        tx.rollback(None).unwrap();

        assert_eq!(fs::read(dir.path().join("a.mp4")).unwrap(), b"old");
        assert!(!dir.path().join("a.mp4.bak").exists());
    }

    #[test]
    fn commit_discards_backup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"old").unwrap();
        let decision = overwritten(dir.path(), "a.mp4");

        let mut tx = Transaction::new();
        tx.record_decision(&decision);
        fs::write(&decision.final_path, b"new").unwrap();
        tx.commit().unwrap();

        assert_eq!(fs::read(dir.path().join("a.mp4")).unwrap(), b"new");
        assert!(!dir.path().join("a.mp4.bak").exists());
    }

    #[test]
    fn kept_file_survives_rollback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"old").unwrap();
        let decision = overwritten(dir.path(), "a.mp4");

        let mut tx = Transaction::new();
        tx.record_decision(&decision);
        fs::write(&decision.final_path, b"fetched").unwrap();
        tx.track_output(&decision.final_path);
        tx.rollback(Some(&decision.final_path)).unwrap();

        assert_eq!(fs::read(dir.path().join("a.mp4")).unwrap(), b"fetched");
        assert!(!dir.path().join("a.mp4.bak").exists());
    }

    #[test]
    fn sweeps_only_partials_of_the_base_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["song.m4a.part", "song.f140.m4a.ytdl", "song.mp4.part-Frag3", "song.mp4", "other.part"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let mut found = partial_artifacts(dir.path(), "song");
        found.sort();
        assert_eq!(found.len(), 3);

        let mut tx = Transaction::new();
        tx.record_decision(&ConflictDecision::free(dir.path().join("song.mp4")));
        tx.commit().unwrap();
        assert!(dir.path().join("song.mp4").exists());
        assert!(dir.path().join("other.part").exists());
        assert!(!dir.path().join("song.m4a.part").exists());
    }

    #[test]
    fn sweep_leaves_names_that_merely_share_a_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Talk.mp4.part", "Talk show.mp4.part", "Talkback.m4a.ytdl", "Talk (2).mp4.temp"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let found = partial_artifacts(dir.path(), "Talk");
        assert_eq!(found, vec![dir.path().join("Talk.mp4.part")]);

        let mut tx = Transaction::new();
        tx.record_decision(&ConflictDecision::free(dir.path().join("Talk.mp4")));
        tx.rollback(None).unwrap();
        assert!(dir.path().join("Talk show.mp4.part").exists());
        assert!(dir.path().join("Talkback.m4a.ytdl").exists());
        assert!(dir.path().join("Talk (2).mp4.temp").exists());
    }

    #[test]
    fn discarding_an_intermediate_restores_what_it_displaced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"old").unwrap();
        let decision = overwritten(dir.path(), "a.mp4");

        let mut tx = Transaction::new();
        tx.record_decision(&decision);
        fs::write(&decision.final_path, b"fetched").unwrap();
        tx.track_output(&decision.final_path);
        tx.discard(&decision.final_path).unwrap();
        assert!(!tx.has_backups());
        tx.commit().unwrap();

        assert_eq!(fs::read(dir.path().join("a.mp4")).unwrap(), b"old");
        assert!(!dir.path().join("a.mp4.bak").exists());
    }

    #[test]
    fn handed_over_file_survives_rollback() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("a.mp4");
        let clip = dir.path().join("a [clip].mp4");

        let mut tx = Transaction::new();
        tx.record_decision(&ConflictDecision::free(original.clone()));
        fs::write(&original, b"fetched").unwrap();
        tx.track_output(&original);
        tx.hand_over(&original);
        fs::write(&clip, b"clip").unwrap();
        tx.track_output(&clip);
        tx.rollback(None).unwrap();

        assert_eq!(fs::read(&original).unwrap(), b"fetched");
        assert!(!clip.exists());
    }

    #[test]
    fn finds_files_sharing_the_exact_base() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Talk.webm", "Talk.m4a", "Talk show.webm", "Talk"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let mut found = files_with_base(dir.path(), "Talk");
        found.sort();
        assert_eq!(found, vec![dir.path().join("Talk.m4a"), dir.path().join("Talk.webm")]);
    }
}
