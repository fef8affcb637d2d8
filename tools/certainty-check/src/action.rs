//! Check-run orchestration: fetch PR, open check, assess, post, decide exit.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::{Config, HostContext};
use crate::error::EngineError;
use crate::gateway::{
  find_certainty_score, parse_pr_number, validate_repo_name, CheckRunId, CheckRunSink,
  CheckRunUpdate, PullRequestSource,
};
use crate::risk;
use crate::score::{CertaintyScore, Conclusion};

/// Details text posted when the assessment errored.
pub const ERROR_DETAILS: &str = "There was an error running the deploy risk assessment.";

/// Outcome of one check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
  pub score: CertaintyScore,
  /// Something went wrong; `score` may be the placeholder.
  pub errored: bool,
}

impl RunReport {
  pub fn should_fail(&self, block_on_failure: bool) -> bool {
    self.errored || (block_on_failure && self.score.conclusion() == Conclusion::Failure)
  }

  pub fn exit_code(&self, block_on_failure: bool) -> i32 {
    i32::from(self.should_fail(block_on_failure))
  }
}

/// Run the full check for the pull request named by `ctx`.
///
/// Errors never escape: they are logged, a placeholder failure is posted if a
/// check run was already opened, and the report is marked errored.
pub fn run_check<S, K>(
  source: &S,
  sink: &mut K,
  ctx: &HostContext,
  config: &Config,
  now: DateTime<Utc>,
) -> RunReport
where
  S: PullRequestSource + ?Sized,
  K: CheckRunSink + ?Sized,
{
  let mut check_id: Option<CheckRunId> = None;
  let mut score: Option<CertaintyScore> = None;

  match execute(source, sink, ctx, config, now, &mut check_id, &mut score) {
    Ok(score) => RunReport {
      score,
      errored: false,
    },
    Err(e) => {
      error!(error = %e, "There was an error running the deploy risk assessment.");
      let score = score.unwrap_or_else(CertaintyScore::unknown_error);
      if let Some(id) = check_id {
        report_error(sink, &ctx.repository, id, &score);
      }
      RunReport {
        score,
        errored: true,
      }
    }
  }
}

fn execute<S, K>(
  source: &S,
  sink: &mut K,
  ctx: &HostContext,
  config: &Config,
  now: DateTime<Utc>,
  check_id: &mut Option<CheckRunId>,
  score: &mut Option<CertaintyScore>,
) -> Result<CertaintyScore, EngineError>
where
  S: PullRequestSource + ?Sized,
  K: CheckRunSink + ?Sized,
{
  validate_repo_name(&ctx.repository)?;
  let number = parse_pr_number(&ctx.git_ref)?;
  let pr = source.pull_request(&ctx.repository, number)?;

  if ctx.sha.is_empty() {
    return Err(EngineError::validation("sha", "Commit SHA is required"));
  }
  let id = sink.create_check_run(&ctx.repository, &ctx.sha)?;
  *check_id = Some(id);

  let assessed = risk::assess(&pr.files, &pr.reviewers, config, now)?;
  let update = CheckRunUpdate::from_score(&assessed, None)?;
  // Kept so a failed post still reports the real score.
  *score = Some(assessed.clone());

  sink.complete_check_run(&ctx.repository, id, &update)?;
  info!(
    score = assessed.score(),
    conclusion = update.conclusion.as_str(),
    "check run updated"
  );

  verify_posted(sink, ctx);
  Ok(assessed)
}

/// Read the posted score back; mismatches and failures are only logged.
fn verify_posted<K>(sink: &K, ctx: &HostContext)
where
  K: CheckRunSink + ?Sized,
{
  match sink.check_runs(&ctx.repository, &ctx.sha) {
    Ok(runs) => match find_certainty_score(&runs) {
      Some(posted) => debug!(score = posted.score(), "posted certainty score verified"),
      None => warn!("no certainty score found on commit after posting"),
    },
    Err(e) => warn!(error = %e, "failed to list check runs"),
  }
}

fn report_error<K>(sink: &mut K, repository: &str, id: CheckRunId, score: &CertaintyScore)
where
  K: CheckRunSink + ?Sized,
{
  let posted = CheckRunUpdate::from_score(score, Some(ERROR_DETAILS))
    .and_then(|update| sink.complete_check_run(repository, id, &update));
  if let Err(e) = posted {
    error!(error = %e, "failed to post error result to check run");
  }
}
