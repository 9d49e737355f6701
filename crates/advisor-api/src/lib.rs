//! OpenAI-compatible chat-completions client for Advisor.

mod client;
mod provider;
mod retry;

pub use client::ApiClient;
pub use provider::OpenAiProvider;
pub use retry::RetryConfig;
