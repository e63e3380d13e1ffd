mod gemini;

pub use gemini::GeminiAnalyzer;

/// Multimodal analysis provider interface
///
/// Implementations make exactly one remote call per `analyze`; retry policy
/// belongs to the caller.
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    /// Send `prompt` plus a PNG image, return the extracted answer text
    async fn analyze(&self, prompt: &str, image_png: &[u8]) -> Result<String, AnalyzeError>;

    /// Provider metadata
    fn metadata(&self) -> AnalyzerMetadata;
}

#[derive(Debug, Clone)]
pub struct AnalyzerMetadata {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("503 UNAVAILABLE: {0}")]
    Unavailable(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no answer in response: {0}")]
    EmptyResponse(String),

    #[error("failed to initialize analyzer: {0}")]
    Init(String),
}

impl AnalyzeError {
    /// Transient "service unavailable" failures are worth retrying; nothing else is
    pub fn is_retryable(&self) -> bool {
        if matches!(self, AnalyzeError::Unavailable(_)) {
            return true;
        }
        let text = self.to_string();
        text.contains("503") || text.contains("UNAVAILABLE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AnalyzeError::Unavailable("model overloaded".into()).is_retryable());
        assert!(
            AnalyzeError::Api {
                status: 500,
                message: "upstream said 503".into()
            }
            .is_retryable()
        );

        assert!(!AnalyzeError::Authentication("invalid API key".into()).is_retryable());
        assert!(!AnalyzeError::Quota("daily limit".into()).is_retryable());
        assert!(!AnalyzeError::InvalidRequest("bad image".into()).is_retryable());
        assert!(!AnalyzeError::EmptyResponse("SAFETY".into()).is_retryable());
    }
}
