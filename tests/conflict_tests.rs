use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use grabx_cli::app::AutoConfirm;
use grabx_cli::domain::model::{ConflictOutcome, ConflictDecision};
use grabx_cli::output::{ConflictPolicy, ConflictResolver, Transaction};
use grabx_cli::ports::ConfirmationPort;

fn resolver(policy: ConflictPolicy, answer_with: ConflictPolicy) -> ConflictResolver {
    let confirm: Arc<dyn ConfirmationPort> = Arc::new(AutoConfirm::new(answer_with, false));
    ConflictResolver::new(confirm, policy)
}

#[tokio::test]
async fn free_path_is_returned_unchanged() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("clip.mp4");

    // a prompting resolver that would cancel proves nobody was asked
    let decision = resolver(ConflictPolicy::Prompt, ConflictPolicy::Prompt)
        .resolve(&target)
        .await
        .unwrap();
    assert_eq!(decision, ConflictDecision::free(target.clone()));

    let again = resolver(ConflictPolicy::Prompt, ConflictPolicy::Prompt)
        .resolve(&target)
        .await
        .unwrap();
    assert_eq!(again, decision);
}

#[tokio::test]
async fn rename_skips_taken_numbers() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("clip.mp4");
    for name in ["clip.mp4", "clip (1).mp4", "clip (2).mp4"] {
        fs::write(dir.path().join(name), b"x").unwrap();
    }

    let decision = resolver(ConflictPolicy::Prompt, ConflictPolicy::Rename)
        .resolve(&target)
        .await
        .unwrap();
    assert_eq!(decision.outcome, ConflictOutcome::Renamed);
    assert_eq!(decision.final_path, dir.path().join("clip (3).mp4"));
    assert_eq!(decision.backup_path, None);
}

#[tokio::test]
async fn overwrite_replaces_a_stale_backup() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("clip.mp4");
    fs::write(&target, b"current").unwrap();
    fs::write(dir.path().join("clip.mp4.bak"), b"stale").unwrap();

    let decision = resolver(ConflictPolicy::Overwrite, ConflictPolicy::Prompt)
        .resolve(&target)
        .await
        .unwrap();
    assert_eq!(decision.outcome, ConflictOutcome::Overwritten);
    let backup = decision.backup_path.clone().unwrap();
    assert!(!target.exists());
    assert_eq!(fs::read(&backup).unwrap(), b"current");

    // rolling back puts the original where it was
    let mut transaction = Transaction::new();
    transaction.record_decision(&decision);
    fs::write(&target, b"new").unwrap();
    transaction.track_output(&target);
    transaction.rollback(None).unwrap();
    assert_eq!(fs::read(&target).unwrap(), b"current");
    assert!(!backup.exists());
}

#[tokio::test]
async fn prompt_answered_with_cancel_keeps_the_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("clip.mp4");
    fs::write(&target, b"current").unwrap();

    let decision = resolver(ConflictPolicy::Prompt, ConflictPolicy::Prompt)
        .resolve(&target)
        .await
        .unwrap();
    assert_eq!(decision.outcome, ConflictOutcome::Cancelled);
    assert_eq!(fs::read(&target).unwrap(), b"current");
}
