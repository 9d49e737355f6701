//! Provider trait for chat-completion backends.

use crate::{ApiError, ChatCompletionRequest, ChatCompletionResponse};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ChatProvider::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatCompletionResponse, ApiError>> + Send + 'a>>;

/// Trait for chat-completion providers.
///
/// Dyn-compatible so the responder works with `Arc<dyn ChatProvider>`.
pub trait ChatProvider: Send + Sync {
    /// Send a single, non-streaming completion request.
    fn complete<'a>(&'a self, request: &'a ChatCompletionRequest) -> CompletionFuture<'a>;

    /// Provider name for logging/display (e.g., "openai").
    fn name(&self) -> &str;
}
