//! Chat-completions HTTP client.

use std::time::Duration;

use advisor_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, truncate_str};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::retry::{RetryConfig, calculate_delay, is_retryable};

/// Error bodies longer than this are cut before they end up in messages.
const MAX_ERROR_BODY_BYTES: usize = 500;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Set the retry configuration for transient errors (429, 5xx, network).
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Send a non-streaming completion request.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                ApiError::Auth {
                    message: "Invalid API key format".into(),
                }
            })?,
        );

        let body = serde_json::to_string(request).map_err(|e| ApiError::BadRequest {
            message: format!("Failed to serialize request: {e}"),
        })?;

        for attempt in 0..=self.retry_config.max_retries {
            tracing::debug!(
                "POST {url} (attempt {}/{})",
                attempt + 1,
                self.retry_config.max_retries + 1
            );

            let result = self
                .http
                .post(&url)
                .headers(headers.clone())
                .body(body.clone())
                .send()
                .await;

            let delay = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| ApiError::Network(e.to_string()))?;
                        return parse_completion(&text);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body_text = response.text().await.unwrap_or_default();
                    let err = classify_error(status.as_u16(), &body_text, retry_after);

                    if !is_retryable(&err) || attempt == self.retry_config.max_retries {
                        return Err(err);
                    }

                    let delay = calculate_delay(&self.retry_config, attempt, retry_after);
                    tracing::warn!(
                        "Retryable API error (attempt {}/{}): {err}. Retrying in {delay}ms...",
                        attempt + 1,
                        self.retry_config.max_retries + 1,
                    );
                    delay
                }
                Err(e) => {
                    let err = if e.is_timeout() {
                        ApiError::Timeout
                    } else {
                        ApiError::Network(e.to_string())
                    };

                    if attempt == self.retry_config.max_retries {
                        return Err(err);
                    }

                    let delay = calculate_delay(&self.retry_config, attempt, None);
                    tracing::warn!(
                        "Retryable network error (attempt {}/{}): {err}. Retrying in {delay}ms...",
                        attempt + 1,
                        self.retry_config.max_retries + 1,
                    );
                    delay
                }
            };

            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        unreachable!("retry loop should have returned")
    }
}

fn parse_completion(body: &str) -> Result<ChatCompletionResponse, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        ApiError::MalformedResponse(format!(
            "{e}: {}",
            truncate_str(body, MAX_ERROR_BODY_BYTES)
        ))
    })
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed ApiError.
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ApiError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        code: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error);
    let code = detail.as_ref().and_then(|d| d.code.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| truncate_str(body, MAX_ERROR_BODY_BYTES).to_string());

    match status {
        401 | 403 => ApiError::Auth { message },
        400 => ApiError::BadRequest { message },
        429 if code.as_deref() == Some("insufficient_quota") => {
            ApiError::QuotaExceeded { message }
        }
        429 => ApiError::RateLimited {
            retry_after_ms: retry_after,
        },
        _ => ApiError::Server { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_retry_after_integer() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("5"));
        assert_eq!(parse_retry_after(&headers), Some(5000));
    }

    #[test]
    fn parse_retry_after_float() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after(&headers), Some(1500));
    }

    #[test]
    fn parse_retry_after_missing_or_invalid() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn classify_error_429_rate_limit() {
        let err = classify_error(
            429,
            r#"{"error":{"message":"slow down","code":"rate_limit_exceeded"}}"#,
            Some(3000),
        );
        match err {
            ApiError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(3000)),
            _ => panic!("Expected RateLimited, got {err:?}"),
        }
    }

    #[test]
    fn classify_error_429_insufficient_quota() {
        let err = classify_error(
            429,
            r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#,
            None,
        );
        match err {
            ApiError::QuotaExceeded { message } => assert!(message.contains("quota")),
            _ => panic!("Expected QuotaExceeded, got {err:?}"),
        }
    }

    #[test]
    fn classify_error_401_and_403_are_auth() {
        let err = classify_error(401, r#"{"error":{"message":"Incorrect API key"}}"#, None);
        assert!(matches!(err, ApiError::Auth { ref message } if message == "Incorrect API key"));
        assert!(matches!(
            classify_error(403, "forbidden", None),
            ApiError::Auth { .. }
        ));
    }

    #[test]
    fn classify_error_500_uses_body_message() {
        let err = classify_error(500, r#"{"error":{"message":"boom"}}"#, None);
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            _ => panic!("Expected Server, got {err:?}"),
        }
    }

    #[test]
    fn classify_error_plain_body_is_truncated() {
        let body = "x".repeat(2000);
        match classify_error(502, &body, None) {
            ApiError::Server { message, .. } => assert_eq!(message.len(), MAX_ERROR_BODY_BYTES),
            other => panic!("Expected Server, got {other:?}"),
        }
    }

    #[test]
    fn parse_completion_rejects_garbage() {
        let err = parse_completion("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(ref m) if m.contains("<html>")));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = ApiClient::new("key", "https://api.example.com/").unwrap();
        assert_eq!(client.base_url, "https://api.example.com");
    }
}
