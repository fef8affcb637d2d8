//! Certainty score result model: validated score, reasons, flagged files, conclusion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// Check-run conclusion states. Only `Success` and `Failure` come out of the
/// assessor; the rest exist because the check-run protocol defines them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
  Success,
  #[default]
  Neutral,
  Failure,
  Cancelled,
  Skipped,
  TimedOut,
  ActionRequired,
}

impl Conclusion {
  pub const ALL: [Conclusion; 7] = [
    Self::Success,
    Self::Neutral,
    Self::Failure,
    Self::Cancelled,
    Self::Skipped,
    Self::TimedOut,
    Self::ActionRequired,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Neutral => "neutral",
      Self::Failure => "failure",
      Self::Cancelled => "cancelled",
      Self::Skipped => "skipped",
      Self::TimedOut => "timed_out",
      Self::ActionRequired => "action_required",
    }
  }

  /// Membership test for a wire value.
  pub fn is_valid(value: &str) -> bool {
    Self::ALL.iter().any(|c| c.as_str() == value)
  }
}

impl fmt::Display for Conclusion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Conclusion {
  type Err = EngineError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| {
        let allowed: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
        EngineError::validation(
          "conclusion",
          &format!(
            "invalid conclusion: {}. Must be one of: {}",
            s,
            allowed.join(", ")
          ),
        )
      })
  }
}

/// One completed risk evaluation.
///
/// Immutable once built: every constructor validates, and there are no setters.
/// Serializes to `{"score", "reasons", "files", "conclusion"}`, the shape posted
/// as a check-run summary and read back on later runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct CertaintyScore {
  score: u8,
  reasons: Vec<String>,
  files: Vec<String>,
  conclusion: Conclusion,
}

impl CertaintyScore {
  pub fn new(
    score: i64,
    reasons: Vec<String>,
    files: Vec<String>,
    conclusion: Conclusion,
  ) -> Result<Self, EngineError> {
    let score = check_score(score)?;
    Ok(Self {
      score,
      reasons,
      files,
      conclusion,
    })
  }

  /// Score only; no reasons or files, `neutral` conclusion.
  pub fn from_score(score: i64) -> Result<Self, EngineError> {
    Self::new(score, Vec::new(), Vec::new(), Conclusion::default())
  }

  /// Placeholder reported when the assessment itself could not run.
  pub fn unknown_error() -> Self {
    Self {
      score: 0,
      reasons: vec!["Unknown error".to_string()],
      files: Vec::new(),
      conclusion: Conclusion::Failure,
    }
  }

  pub fn score(&self) -> u8 {
    self.score
  }

  pub fn reasons(&self) -> &[String] {
    &self.reasons
  }

  pub fn files(&self) -> &[String] {
    &self.files
  }

  pub fn conclusion(&self) -> Conclusion {
    self.conclusion
  }

  pub fn to_value(&self) -> Result<Value, EngineError> {
    Ok(serde_json::to_value(self)?)
  }

  pub fn to_json(&self) -> Result<String, EngineError> {
    Ok(serde_json::to_string(self)?)
  }

  /// Rebuild from a transport object. Missing `score` is 0, missing lists are
  /// empty, missing `conclusion` is `neutral`; everything present is validated,
  /// score first.
  pub fn from_value(value: Value) -> Result<Self, EngineError> {
    let map = match value {
      Value::Object(map) => map,
      other => {
        return Err(EngineError::parse(format!(
          "certainty score must be a JSON object, got {}",
          json_kind(&other)
        )))
      }
    };

    let score = match map.get("score") {
      None => 0,
      Some(v) => score_from_value(v)?,
    };
    let score = check_score(score)?;
    let reasons = string_list(&map, "reasons")?;
    let files = string_list(&map, "files")?;
    let conclusion = match map.get("conclusion") {
      None => Conclusion::default(),
      Some(Value::String(s)) => s.parse()?,
      Some(_) => return Err(EngineError::validation("conclusion", "must be a string")),
    };

    Ok(Self {
      score,
      reasons,
      files,
      conclusion,
    })
  }

  pub fn from_json(raw: &str) -> Result<Self, EngineError> {
    let value: Value = serde_json::from_str(raw)?;
    Self::from_value(value)
  }

  /// Three-line human-readable rendering used as the check-run details text.
  pub fn summary(&self) -> String {
    let reasons_text = if self.reasons.is_empty() {
      "No specific concerns".to_string()
    } else {
      self.reasons.join(", ")
    };
    let files_text = if self.files.is_empty() {
      "No specific files".to_string()
    } else {
      self.files.join(", ")
    };
    format!(
      "Certainty Score: {}/100 ({})\nConcerns: {}\nFiles: {}",
      self.score,
      self.conclusion.as_str().to_uppercase(),
      reasons_text,
      files_text
    )
  }
}

impl TryFrom<Value> for CertaintyScore {
  type Error = EngineError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    Self::from_value(value)
  }
}

fn check_score(score: i64) -> Result<u8, EngineError> {
  if !(0..=100).contains(&score) {
    return Err(EngineError::validation("score", "must be between 0 and 100"));
  }
  u8::try_from(score).map_err(|_| EngineError::validation("score", "must be between 0 and 100"))
}

fn score_from_value(v: &Value) -> Result<i64, EngineError> {
  match v.as_i64() {
    Some(n) => Ok(n),
    // Integers beyond i64 are still integers, just out of range.
    None if v.is_u64() => Err(EngineError::validation("score", "must be between 0 and 100")),
    None => Err(EngineError::validation("score", "must be an integer")),
  }
}

fn string_list(map: &Map<String, Value>, field: &str) -> Result<Vec<String>, EngineError> {
  let items = match map.get(field) {
    None => return Ok(Vec::new()),
    Some(Value::Array(items)) => items,
    Some(_) => return Err(EngineError::validation(field, "must be a list of strings")),
  };
  items
    .iter()
    .map(|item| {
      item
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation(field, "must be a list of strings"))
    })
    .collect()
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
