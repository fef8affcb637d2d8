//! Integration tests for the certainty check.

use certainty_check::action::ERROR_DETAILS;
use certainty_check::gateway::{
  CheckRunId, CheckRunRecord, CheckRunSink, CheckRunUpdate, PullRequest, PullRequestSource,
  CHECK_RUN_NAME,
};
use certainty_check::{
  assess, run_check, CertaintyScore, Conclusion, Config, EngineError, FileChange, HostContext,
};
use chrono::{DateTime, TimeZone, Utc};

fn wednesday() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
}

fn fixture_pr() -> PullRequest {
  let json = r#"{
    "number": 42,
    "files": [
      {"filename": "config/.env", "status": "modified", "additions": 1},
      "main.py"
    ],
    "reviewers": ["octocat"]
  }"#;
  serde_json::from_str(json).unwrap()
}

fn ctx() -> HostContext {
  HostContext {
    repository: "acme/web".into(),
    sha: "abc123def".into(),
    git_ref: "refs/pull/42/merge".into(),
  }
}

struct FakeSource {
  pr: Option<PullRequest>,
}

impl PullRequestSource for FakeSource {
  fn pull_request(&self, repository: &str, number: u64) -> Result<PullRequest, EngineError> {
    assert_eq!(repository, "acme/web");
    match &self.pr {
      Some(pr) if pr.number == number => Ok(pr.clone()),
      _ => Err(EngineError::collaborator(format!("pull request {} not found", number))),
    }
  }
}

#[derive(Default)]
struct FakeSink {
  created: Vec<String>,
  completed: Vec<(CheckRunId, CheckRunUpdate)>,
  fail_complete: bool,
  fail_create: bool,
}

impl CheckRunSink for FakeSink {
  fn create_check_run(&mut self, _repository: &str, head_sha: &str) -> Result<CheckRunId, EngineError> {
    if self.fail_create {
      return Err(EngineError::collaborator("API error"));
    }
    self.created.push(head_sha.to_string());
    Ok(CheckRunId(7))
  }

  fn complete_check_run(
    &mut self,
    _repository: &str,
    id: CheckRunId,
    update: &CheckRunUpdate,
  ) -> Result<(), EngineError> {
    self.completed.push((id, update.clone()));
    if self.fail_complete {
      return Err(EngineError::collaborator("check run update rejected"));
    }
    Ok(())
  }

  fn check_runs(&self, _repository: &str, _head_sha: &str) -> Result<Vec<CheckRunRecord>, EngineError> {
    Ok(
      self
        .completed
        .iter()
        .map(|(_, u)| CheckRunRecord {
          name: CHECK_RUN_NAME.into(),
          summary: Some(u.summary.clone()),
        })
        .collect(),
    )
  }
}

#[test]
fn check_run_is_created_and_completed_with_score() {
  let source = FakeSource {
    pr: Some(fixture_pr()),
  };
  let mut sink = FakeSink::default();
  let report = run_check(&source, &mut sink, &ctx(), &Config::default(), wednesday());

  assert!(!report.errored);
  assert_eq!(report.score.score(), 70);
  assert_eq!(report.score.files(), ["config/.env".to_string()]);
  assert_eq!(report.score.conclusion(), Conclusion::Success);
  assert_eq!(report.exit_code(true), 0);

  assert_eq!(sink.created, vec!["abc123def".to_string()]);
  assert_eq!(sink.completed.len(), 1);
  let (id, update) = &sink.completed[0];
  assert_eq!(*id, CheckRunId(7));
  assert_eq!(update.title, "Certainty Score: 70");
  assert_eq!(update.text, report.score.summary());
  assert_eq!(CertaintyScore::from_json(&update.summary).unwrap(), report.score);
}

#[test]
fn blocking_failure_sets_exit_code() {
  let mut pr = fixture_pr();
  pr.reviewers.clear();
  let source = FakeSource { pr: Some(pr) };
  let mut sink = FakeSink::default();
  let report = run_check(&source, &mut sink, &ctx(), &Config::default(), wednesday());

  assert!(!report.errored);
  assert_eq!(report.score.score(), 60);
  assert_eq!(report.score.conclusion(), Conclusion::Failure);
  assert_eq!(report.exit_code(true), 1);
  assert_eq!(report.exit_code(false), 0);
}

#[test]
fn error_before_check_run_posts_nothing() {
  let source = FakeSource {
    pr: Some(fixture_pr()),
  };
  let mut sink = FakeSink {
    fail_create: true,
    ..FakeSink::default()
  };
  let report = run_check(&source, &mut sink, &ctx(), &Config::default(), wednesday());

  assert!(report.errored);
  assert_eq!(report.score, CertaintyScore::unknown_error());
  assert!(sink.completed.is_empty());
  assert_eq!(report.exit_code(false), 1);
}

#[test]
fn missing_pull_request_is_reported_as_error() {
  let source = FakeSource { pr: None };
  let mut sink = FakeSink::default();
  let report = run_check(&source, &mut sink, &ctx(), &Config::default(), wednesday());
  assert!(report.errored);
  assert!(sink.created.is_empty());
}

#[test]
fn failed_post_is_retried_with_error_details() {
  let source = FakeSource {
    pr: Some(fixture_pr()),
  };
  let mut sink = FakeSink {
    fail_complete: true,
    ..FakeSink::default()
  };
  let report = run_check(&source, &mut sink, &ctx(), &Config::default(), wednesday());

  assert!(report.errored);
  // The computed score survives; only the details text changes.
  assert_eq!(report.score.score(), 70);
  assert_eq!(sink.completed.len(), 2);
  assert_eq!(sink.completed[1].1.text, ERROR_DETAILS);
}

#[test]
fn branch_ref_is_rejected() {
  let source = FakeSource {
    pr: Some(fixture_pr()),
  };
  let mut sink = FakeSink::default();
  let mut host = ctx();
  host.git_ref = "refs/heads/main".into();
  let report = run_check(&source, &mut sink, &host, &Config::default(), wednesday());
  assert!(report.errored);
  assert_eq!(report.score.reasons(), ["Unknown error".to_string()]);
}

#[test]
fn deterministic_output_across_runs() {
  let pr = fixture_pr();
  let config = Config::default();
  let a = assess(&pr.files, &pr.reviewers, &config, wednesday()).unwrap();
  let b = assess(&pr.files, &pr.reviewers, &config, wednesday()).unwrap();
  assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn posted_summary_round_trips_through_transport() {
  let files = vec![FileChange {
    filename: "keys/prod.pem".into(),
  }];
  let reviewers: Vec<String> = Vec::new();
  let score = assess(&files, &reviewers, &Config::default(), wednesday()).unwrap();
  let value = score.to_value().unwrap();
  assert_eq!(value["conclusion"], "failure");
  assert_eq!(CertaintyScore::from_value(value).unwrap(), score);
}
