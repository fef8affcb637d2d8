//! Structured error types for the certainty check.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// A certainty score (or a value feeding one) broke an invariant.
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  /// Input that is well-formed JSON but not the expected structure.
  #[error("parse: {0}")]
  Parse(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  /// A configuration value is present but malformed.
  #[error("config: {key}: {reason}")]
  Config { key: String, reason: String },

  /// Failure reported by the pull request source or the check-run sink.
  #[error("collaborator: {0}")]
  Collaborator(String),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn parse(msg: impl Into<String>) -> Self {
    Self::Parse(msg.into())
  }

  pub fn config(key: &str, reason: impl Into<String>) -> Self {
    Self::Config {
      key: key.to_string(),
      reason: reason.into(),
    }
  }

  pub fn collaborator(msg: impl Into<String>) -> Self {
    Self::Collaborator(msg.into())
  }
}
