//! Deploy risk rules: file volume, secret-looking files, late Friday, missing reviewers.
//!
//! Each rule adds to a risk accumulator; certainty is `max(0, 10 - risk) * 10`.
//! Rules run in a fixed order so reasons come out in the same order every time.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::EngineError;
use crate::score::{CertaintyScore, Conclusion};

pub const REASON_SUSPICIOUS_FILES: &str = "Suspicious file(s)";
pub const REASON_LATE_FRIDAY: &str = "Deploying late on Friday";
pub const REASON_NO_REVIEWER: &str = "No reviewer assigned";
pub const REASON_ALL_GOOD: &str = "All good. No major risks detected.";

const VOLUME_RISK: u32 = 2;
const SECRET_FILE_RISK: u32 = 3;
const LATE_FRIDAY_RISK: u32 = 2;
const NO_REVIEWER_RISK: u32 = 1;
/// Hour (UTC, 24h clock) from which a Friday deploy counts as late.
const LATE_FRIDAY_HOUR: u32 = 16;

/// Anything that carries a changed file's name.
pub trait ChangedFile {
  fn filename(&self) -> &str;
}

/// A changed file as reported by the pull request source.
///
/// Accepts either a bare string or an object with a `filename` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFileChange")]
pub struct FileChange {
  pub filename: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFileChange {
  Name(String),
  Record { filename: String },
}

impl From<RawFileChange> for FileChange {
  fn from(raw: RawFileChange) -> Self {
    match raw {
      RawFileChange::Name(filename) | RawFileChange::Record { filename } => Self { filename },
    }
  }
}

impl ChangedFile for FileChange {
  fn filename(&self) -> &str {
    &self.filename
  }
}

impl ChangedFile for String {
  fn filename(&self) -> &str {
    self
  }
}

impl ChangedFile for &str {
  fn filename(&self) -> &str {
    self
  }
}

/// Assess a change set at an explicit point in time.
///
/// `reviewers` is opaque: only whether it is empty matters. The conclusion is
/// binary, `success` when certainty reaches `config.min_certainty` and
/// `failure` otherwise.
pub fn assess<F, R>(
  changed_files: &[F],
  reviewers: &[R],
  config: &Config,
  current_time: DateTime<Utc>,
) -> Result<CertaintyScore, EngineError>
where
  F: ChangedFile,
{
  let mut risk: u32 = 0;
  let mut reasons: Vec<String> = Vec::new();
  let mut flagged: Vec<String> = Vec::new();

  // Volume
  if changed_files.len() > config.max_files {
    risk += VOLUME_RISK;
    reasons.push(format!(
      "{} files changed (max is {})",
      changed_files.len(),
      config.max_files
    ));
  }

  // Secret-looking files: literal suffix match, each file counted once.
  for file in changed_files {
    let name = file.filename();
    if is_suspicious(name, &config.secret_patterns) {
      risk += SECRET_FILE_RISK;
      flagged.push(name.to_string());
    }
  }
  if !flagged.is_empty() {
    reasons.push(REASON_SUSPICIOUS_FILES.to_string());
  }

  if config.check_work_hours && is_late_friday(current_time) {
    risk += LATE_FRIDAY_RISK;
    reasons.push(REASON_LATE_FRIDAY.to_string());
  }

  if reviewers.is_empty() {
    risk += NO_REVIEWER_RISK;
    reasons.push(REASON_NO_REVIEWER.to_string());
  }

  let certainty = certainty_from_risk(risk);
  let conclusion = if certainty >= config.min_certainty {
    Conclusion::Success
  } else {
    Conclusion::Failure
  };
  if reasons.is_empty() {
    reasons.push(REASON_ALL_GOOD.to_string());
  }

  debug!(
    files = changed_files.len(),
    flagged = flagged.len(),
    risk,
    certainty,
    conclusion = conclusion.as_str(),
    "assessed change set"
  );

  CertaintyScore::new(i64::from(certainty), reasons, flagged, conclusion)
}

/// [`assess`] against the current UTC time.
pub fn assess_now<F, R>(
  changed_files: &[F],
  reviewers: &[R],
  config: &Config,
) -> Result<CertaintyScore, EngineError>
where
  F: ChangedFile,
{
  assess(changed_files, reviewers, config, Utc::now())
}

fn is_suspicious(filename: &str, patterns: &[String]) -> bool {
  patterns.iter().any(|p| filename.ends_with(p.as_str()))
}

fn is_late_friday(t: DateTime<Utc>) -> bool {
  t.weekday() == Weekday::Fri && t.hour() >= LATE_FRIDAY_HOUR
}

/// 0..=100 in steps of 10; saturates instead of going negative.
fn certainty_from_risk(risk: u32) -> u8 {
  let certainty = 10u32.saturating_sub(risk).saturating_mul(10).min(100);
  u8::try_from(certainty).unwrap_or(100)
}
