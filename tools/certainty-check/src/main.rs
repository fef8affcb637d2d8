//! Binary entrypoint: read one assessment request from stdin, write the score to stdout.
//!
//! Configuration comes from the `INPUT_*` environment variables. Exit code is 1
//! on error, or when the conclusion is `failure` and blocking is enabled.

use std::io::{self, Read, Write};

use certainty_check::{assess, Config, EngineError, FileChange, RunReport};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One JSON object on stdin. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct AssessmentRequest {
  #[serde(default)]
  files: Vec<FileChange>,
  #[serde(default)]
  reviewers: Vec<serde_json::Value>,
  /// RFC3339; defaults to now.
  #[serde(default)]
  current_time: Option<String>,
}

fn main() {
  init_logging();
  match run_binary() {
    Ok(blocked) => {
      if blocked {
        std::process::exit(1);
      }
    }
    Err(e) => {
      let _ = writeln!(io::stderr(), "certainty-check error: {}", e);
      std::process::exit(1);
    }
  }
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr),
    )
    .init();
}

/// Returns whether the pipeline should be blocked.
fn run_binary() -> Result<bool, Box<dyn std::error::Error>> {
  let config = Config::from_env()?;

  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let request: AssessmentRequest = serde_json::from_str(&raw)?;

  let now = match &request.current_time {
    Some(ts) => parse_time(ts)?,
    None => Utc::now(),
  };

  let score = assess(&request.files, &request.reviewers, &config, now)?;
  info!(score = score.score(), conclusion = score.conclusion().as_str(), "assessment complete");

  let json = score.to_json()?;
  let mut out = io::stdout().lock();
  out.write_all(json.as_bytes())?;
  writeln!(out)?;
  out.flush()?;

  let report = RunReport {
    score,
    errored: false,
  };
  Ok(report.should_fail(config.block_on_failure))
}

fn parse_time(ts: &str) -> Result<DateTime<Utc>, EngineError> {
  DateTime::parse_from_rfc3339(ts)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| EngineError::parse(format!("current_time: invalid RFC3339: {}", e)))
}
