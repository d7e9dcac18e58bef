mod common;

use std::sync::Arc;

use common::{run_config, services, with_mode, with_trigger, ApiCall, FakeApi, FakeLauncher, FakeVcs};
use rocode_config::RunMode;
use rocode_devops::ThreadStatus;
use rocode_pr::{run, RunError, TriggerError, SUMMARY_HEADER, WORKING_MESSAGE};

#[tokio::test]
async fn test_headless_review_creates_closed_summary_thread() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new());
    let vcs = Arc::new(FakeVcs::default());
    let agent = Arc::new(FakeLauncher::with_replies(&["LGTM"]));

    let config = with_mode(run_config(root.path()), RunMode::Review);
    let outcome = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.mode, RunMode::Review);
    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ApiCall::CreateThread { content, status } => {
            assert_eq!(*status, ThreadStatus::Closed);
            assert!(content.starts_with(SUMMARY_HEADER));
            assert!(content.contains("LGTM"));
        }
        other => panic!("unexpected call {other:?}"),
    }

    assert_eq!(agent.launches(), 1);
    assert_eq!(agent.shutdowns(), 1);
    assert!(agent.prompts()[0].starts_with("Review pull request #42"));

    let clones = vcs.clones.lock().unwrap().clone();
    assert_eq!(clones.len(), 1);
    assert_eq!(clones[0].0.branch, "feature/docs");
    assert!(!clones[0].1.exists(), "owned workspace should be removed");
    assert!(vcs.commits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_command_commits_pushes_and_edits_reply() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "/oc fix the typo"));
    let vcs = Arc::new(FakeVcs {
        dirty: true,
        ..Default::default()
    });
    let agent = Arc::new(FakeLauncher::with_replies(&[
        "Fixed the typo in README.md.",
        "Fix typo in README and tidy the wording of the introduction",
    ]));

    let config = with_trigger(run_config(root.path()), 7, 3);
    let outcome = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.mode, RunMode::Command);
    let summary = outcome.commit.clone().unwrap();
    assert!(summary.chars().count() <= 40);

    let commits = vcs.commits.lock().unwrap().clone();
    assert_eq!(commits.len(), 1);
    assert!(commits[0].starts_with(&summary));
    assert!(commits[0].ends_with("Co-authored-by: Ada Lovelace <ada@contoso.com>"));
    assert_eq!(*vcs.pushes.lock().unwrap(), vec!["feature/docs".to_string()]);
    assert_eq!(vcs.identities.lock().unwrap().len(), 1);

    let calls = api.calls();
    assert_eq!(
        calls[0],
        ApiCall::AddComment {
            thread_id: 7,
            parent_comment_id: 3,
            content: WORKING_MESSAGE.to_string()
        }
    );
    match &calls[1] {
        ApiCall::EditComment {
            thread_id,
            comment_id,
            content,
        } => {
            assert_eq!((*thread_id, *comment_id), (7, 100));
            assert!(content.contains("Fixed the typo in README.md."));
        }
        other => panic!("unexpected call {other:?}"),
    }
    assert_eq!(calls.len(), 2);

    let prompts = agent.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("/oc fix the typo"));
    assert_eq!(agent.shutdowns(), 1);
}

#[tokio::test]
async fn test_command_without_changes_skips_commit() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "/oc explain this function"));
    let vcs = Arc::new(FakeVcs::default());
    let agent = Arc::new(FakeLauncher::with_replies(&["It parses the header."]));

    let config = with_trigger(run_config(root.path()), 7, 3);
    let outcome = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap();

    assert!(outcome.commit.is_none());
    assert_eq!(agent.prompts().len(), 1);
    assert!(vcs.commits.lock().unwrap().is_empty());
    assert!(vcs.pushes.lock().unwrap().is_empty());
    assert!(matches!(
        &api.calls()[1],
        ApiCall::EditComment { content, .. } if content.contains("It parses the header.")
    ));
}

#[tokio::test]
async fn test_clone_failure_reports_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "/oc fix the typo"));
    let vcs = Arc::new(FakeVcs {
        fail_clone: true,
        ..Default::default()
    });
    let agent = Arc::new(FakeLauncher::with_replies(&["unused"]));

    let config = with_trigger(run_config(root.path()), 7, 3);
    let err = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap_err();

    assert!(!err.is_configuration());
    assert_eq!(agent.launches(), 0);

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    match &calls[1] {
        ApiCall::EditComment { comment_id, content, .. } => {
            assert_eq!(*comment_id, 100);
            assert!(content.contains("could not read from remote repository"));
        }
        other => panic!("unexpected call {other:?}"),
    }

    let clones = vcs.clones.lock().unwrap().clone();
    assert!(!clones[0].1.exists(), "partial clone should be removed");
}

#[tokio::test]
async fn test_headless_failure_creates_closed_thread() {
    let root = tempfile::tempdir().unwrap();
    let mut fake = FakeApi::new();
    fake.fail_pull_request = true;
    let api = Arc::new(fake);
    let vcs = Arc::new(FakeVcs::default());
    let agent = Arc::new(FakeLauncher::default());

    let config = with_mode(run_config(root.path()), RunMode::Review);
    let err = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Failed(_)));
    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        ApiCall::CreateThread { status: ThreadStatus::Closed, content } if content.contains("503")
    ));
    assert!(vcs.clones.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_agent_failure_still_shuts_agent_down() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "/oc-review"));
    let vcs = Arc::new(FakeVcs::default());
    // No scripted replies: the first prompt fails.
    let agent = Arc::new(FakeLauncher::default());

    let config = with_trigger(run_config(root.path()), 7, 3);
    let err = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("no scripted reply left"));
    assert_eq!(agent.launches(), 1);
    assert_eq!(agent.shutdowns(), 1);
    assert_eq!(api.calls().len(), 2);
}

#[tokio::test]
async fn test_trigger_errors_post_nothing() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "thanks, looks good"));
    let vcs = Arc::new(FakeVcs::default());
    let agent = Arc::new(FakeLauncher::default());

    let config = with_trigger(run_config(root.path()), 7, 3);
    let err = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    let err = run(
        run_config(root.path()),
        &services(api.clone(), vcs.clone(), agent.clone()),
    )
    .await
    .unwrap_err();
    assert!(err.is_configuration());

    assert!(api.calls().is_empty());
    assert_eq!(agent.launches(), 0);
    assert!(vcs.clones.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_command_rejects_review_comment() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "/oc-review please"));
    let vcs = Arc::new(FakeVcs {
        dirty: true,
        ..Default::default()
    });
    let agent = Arc::new(FakeLauncher::with_replies(&["Done.", "Apply fix"]));

    let config = with_mode(with_trigger(run_config(root.path()), 7, 3), RunMode::Command);
    let err = run(config, &services(api.clone(), vcs.clone(), agent.clone()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Trigger(TriggerError::ConflictingKeyword { ref keyword }) if keyword == "/oc-review"
    ));
    assert!(api.calls().is_empty());
    assert_eq!(agent.launches(), 0);
    assert!(vcs.clones.lock().unwrap().is_empty());
    assert!(vcs.pushes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_command_with_matching_comment_runs() {
    let root = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new().with_trigger(7, 3, "/oc tidy this up"));
    let vcs = Arc::new(FakeVcs::default());
    let agent = Arc::new(FakeLauncher::with_replies(&["Done."]));

    let config = with_mode(with_trigger(run_config(root.path()), 7, 3), RunMode::Command);
    let outcome = run(config, &services(api.clone(), vcs, agent)).await.unwrap();
    assert_eq!(outcome.mode, RunMode::Command);
}
