//! Seams to the code-hosting platform: pull request data in, check runs out.
//!
//! No client lives here; callers plug in whatever talks to the platform API.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;
use crate::risk::FileChange;
use crate::score::{CertaintyScore, Conclusion};

/// Name of the check run the score is attached to.
pub const CHECK_RUN_NAME: &str = "Certainty Score";

/// Platform-assigned check run identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckRunId(pub u64);

/// What the assessment needs from a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
  pub number: u64,
  #[serde(default)]
  pub files: Vec<FileChange>,
  /// Requested reviewer logins.
  #[serde(default)]
  pub reviewers: Vec<String>,
}

/// A check run as listed for a commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckRunRecord {
  pub name: String,
  #[serde(default)]
  pub summary: Option<String>,
}

/// Completed check-run payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRunUpdate {
  pub conclusion: Conclusion,
  pub title: String,
  /// Serialized [`CertaintyScore`], read back by later runs.
  pub summary: String,
  pub text: String,
}

impl CheckRunUpdate {
  /// `details` replaces the score's human-readable summary as the text body.
  pub fn from_score(score: &CertaintyScore, details: Option<&str>) -> Result<Self, EngineError> {
    Ok(Self {
      conclusion: score.conclusion(),
      title: format!("{}: {}", CHECK_RUN_NAME, score.score()),
      summary: score.to_json()?,
      text: details.map_or_else(|| score.summary(), str::to_string),
    })
  }
}

pub trait PullRequestSource {
  fn pull_request(&self, repository: &str, number: u64) -> Result<PullRequest, EngineError>;
}

pub trait CheckRunSink {
  /// Create an in-progress check run on `head_sha`.
  fn create_check_run(&mut self, repository: &str, head_sha: &str)
    -> Result<CheckRunId, EngineError>;

  /// Mark a check run completed with the given output.
  fn complete_check_run(
    &mut self,
    repository: &str,
    id: CheckRunId,
    update: &CheckRunUpdate,
  ) -> Result<(), EngineError>;

  fn check_runs(&self, repository: &str, head_sha: &str) -> Result<Vec<CheckRunRecord>, EngineError>;
}

/// Pull request number from a ref like `refs/pull/42/merge`.
pub fn parse_pr_number(git_ref: &str) -> Result<u64, EngineError> {
  let not_a_pr = || EngineError::validation("ref", &format!("Ref {} is not a pull request.", git_ref));
  let rest = git_ref.strip_prefix("refs/pull/").ok_or_else(not_a_pr)?;
  let number = rest.split('/').next().unwrap_or_default();
  number.parse().map_err(|_| not_a_pr())
}

/// Repository names are `owner/repo`.
pub fn validate_repo_name(name: &str) -> Result<(), EngineError> {
  if name.is_empty() || !name.contains('/') {
    return Err(EngineError::validation(
      "repository",
      &format!("Invalid repository name: {}", name),
    ));
  }
  Ok(())
}

/// Score previously posted to the `Certainty Score` check run, if any.
///
/// An unparsable summary is logged and treated as absent.
pub fn find_certainty_score(runs: &[CheckRunRecord]) -> Option<CertaintyScore> {
  let run = runs.iter().find(|r| r.name == CHECK_RUN_NAME)?;
  let summary = run.summary.as_deref()?;
  match CertaintyScore::from_json(summary) {
    Ok(score) => Some(score),
    Err(e) => {
      warn!(error = %e, "failed to parse certainty score from check summary");
      None
    }
  }
}
