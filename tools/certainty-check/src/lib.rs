//! Deploy certainty check: rule-based risk scoring for pull requests.
//!
//! Turns changed files, reviewers and submission time into a 0-100 certainty
//! score with reasons, flagged files and a check-run conclusion. Pure
//! computation; the platform API is reached only through the `gateway` traits.

pub mod action;
pub mod config;
pub mod error;
pub mod gateway;
pub mod risk;
pub mod score;

pub use action::{run_check, RunReport};
pub use config::{Config, HostContext};
pub use error::EngineError;
pub use risk::{assess, assess_now, ChangedFile, FileChange};
pub use score::{CertaintyScore, Conclusion};
