//! Check configuration with sane defaults, plus the environment adapter.

use crate::error::EngineError;

pub const ENV_MAX_FILE_COUNT: &str = "INPUT_MAX_FILE_COUNT";
pub const ENV_SECRET_FILE_GLOBS: &str = "INPUT_SECRET_FILE_GLOBS";
pub const ENV_MIN_CERTAINTY: &str = "INPUT_MIN_CERTAINTY";
pub const ENV_CHECK_WORK_HOURS: &str = "INPUT_CHECK_WORK_HOURS";
pub const ENV_BLOCK_ON_FAILURE: &str = "INPUT_BLOCK_ON_FAILURE";

/// Suffixes used when `INPUT_SECRET_FILE_GLOBS` is not set.
pub const ENV_DEFAULT_SECRET_PATTERNS: &str = ".env,.pem";

/// Tunable thresholds for the risk assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// More changed files than this adds the volume penalty.
  pub max_files: usize,
  /// Filename suffixes treated as sensitive (literal, not globs).
  pub secret_patterns: Vec<String>,
  /// Certainty at or above this concludes `success`, below it `failure`.
  pub min_certainty: u8,
  /// Penalize deploys late on Friday (UTC).
  pub check_work_hours: bool,
  /// A `failure` conclusion fails the host process.
  pub block_on_failure: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      max_files: 20,
      secret_patterns: vec![".env".into(), ".pem".into(), "secrets.py".into()],
      min_certainty: 70,
      check_work_hours: true,
      block_on_failure: true,
    }
  }
}

impl Config {
  pub fn from_env() -> Result<Self, EngineError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build from a key lookup. Absent keys keep their defaults; present but
  /// malformed values are errors.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = Self::default();

    let max_files = match lookup(ENV_MAX_FILE_COUNT) {
      Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
        EngineError::config(ENV_MAX_FILE_COUNT, format!("expected a non-negative integer: {}", e))
      })?,
      None => defaults.max_files,
    };

    let secret_patterns = split_patterns(
      &lookup(ENV_SECRET_FILE_GLOBS).unwrap_or_else(|| ENV_DEFAULT_SECRET_PATTERNS.to_string()),
    );

    let min_certainty = match lookup(ENV_MIN_CERTAINTY) {
      Some(raw) => parse_certainty(&raw)?,
      None => defaults.min_certainty,
    };

    let check_work_hours = match lookup(ENV_CHECK_WORK_HOURS) {
      Some(raw) => parse_bool(ENV_CHECK_WORK_HOURS, &raw)?,
      None => defaults.check_work_hours,
    };

    let block_on_failure = match lookup(ENV_BLOCK_ON_FAILURE) {
      Some(raw) => parse_bool(ENV_BLOCK_ON_FAILURE, &raw)?,
      None => defaults.block_on_failure,
    };

    Ok(Self {
      max_files,
      secret_patterns,
      min_certainty,
      check_work_hours,
      block_on_failure,
    })
  }
}

/// Comma-separated suffixes; blanks are dropped since an empty suffix matches every file.
fn split_patterns(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .map(str::to_string)
    .collect()
}

fn parse_certainty(raw: &str) -> Result<u8, EngineError> {
  let value: i64 = raw
    .trim()
    .parse()
    .map_err(|e| EngineError::config(ENV_MIN_CERTAINTY, format!("expected an integer: {}", e)))?;
  u8::try_from(value)
    .ok()
    .filter(|v| *v <= 100)
    .ok_or_else(|| EngineError::config(ENV_MIN_CERTAINTY, format!("{} is outside 0..=100", value)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, EngineError> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "true" => Ok(true),
    "false" => Ok(false),
    other => Err(EngineError::config(key, format!("expected true or false, got {:?}", other))),
  }
}

/// Where the check runs: repository, commit, and the pull request ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
  pub repository: String,
  pub sha: String,
  pub git_ref: String,
}

impl HostContext {
  pub fn from_env() -> Result<Self, EngineError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let git_ref = lookup("GITHUB_REF")
      .filter(|r| !r.is_empty())
      .ok_or_else(|| {
        EngineError::config("GITHUB_REF", "GITHUB_REF environment variable is missing or empty.")
      })?;
    Ok(Self {
      repository: lookup("GITHUB_REPOSITORY").unwrap_or_default(),
      sha: lookup("GITHUB_SHA").unwrap_or_default(),
      git_ref,
    })
  }
}
