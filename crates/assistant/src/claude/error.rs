use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({error_type}): {message}")]
    Api { error_type: String, message: String },

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// The API key cannot be sent as a header.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Error body returned by the Messages API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl From<ApiErrorResponse> for ClaudeError {
    fn from(response: ApiErrorResponse) -> Self {
        Self::Api {
            error_type: response.error.error_type,
            message: response.error.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ClaudeError::RateLimited(30).to_string(),
            "rate limited, retry after 30 seconds"
        );
    }

    #[test]
    fn test_api_error_body_converts() {
        let body = r#"{
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(body).expect("deserialize");
        let error = ClaudeError::from(response);

        assert_eq!(error.to_string(), "API error (overloaded_error): Overloaded");
    }
}
