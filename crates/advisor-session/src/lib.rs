//! Chat transcript persistence for Advisor.

pub mod error;
pub mod store;
pub mod types;

pub use error::SessionError;
pub use store::{DEFAULT_SESSION_FILE, SessionStore};
pub use types::{Message, SessionState};
