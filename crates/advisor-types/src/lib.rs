//! Shared types and error hierarchy for Advisor.

pub mod chat;
pub mod error;
pub mod provider;
pub mod util;

pub use chat::*;
pub use error::{AdvisorError, ApiError, ConfigError, ExtractError, FailureKind};
pub use util::{truncate_str, truncate_string};
