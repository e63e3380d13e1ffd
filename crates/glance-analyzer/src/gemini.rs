use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{AnalyzeError, Analyzer, AnalyzerMetadata};

/// Google Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: String, api_url: String) -> Result<Self, AnalyzeError> {
        if api_key.trim().is_empty() {
            return Err(AnalyzeError::Init("API key is empty".to_string()));
        }
        if model.trim().is_empty() {
            return Err(AnalyzeError::Init("model identifier is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("glance/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalyzeError::Init(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(&self, prompt: &str, image_png: &[u8]) -> Result<String, AnalyzeError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text {
                        text: prompt.to_string(),
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: BASE64.encode(image_png),
                        },
                    },
                ],
            }],
        };

        tracing::debug!(
            "POST {} ({} image bytes)",
            self.endpoint(),
            image_png.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            AnalyzeError::EmptyResponse(format!("failed to parse response: {}", e))
        })?;

        extract_answer(body)
    }

    fn metadata(&self) -> AnalyzerMetadata {
        AnalyzerMetadata {
            provider: "gemini".to_string(),
            model: self.model.clone(),
        }
    }
}

/// Map a non-success HTTP response onto the error taxonomy
fn classify_error(status: StatusCode, body: &str) -> AnalyzeError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let api_status = parsed
        .as_ref()
        .and_then(|e| e.error.status.clone())
        .unwrap_or_default();
    let message = parsed
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });

    match (status, api_status.as_str()) {
        (StatusCode::SERVICE_UNAVAILABLE, _) | (_, "UNAVAILABLE") => {
            AnalyzeError::Unavailable(message)
        }
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => AnalyzeError::Authentication(message),
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "RESOURCE_EXHAUSTED") => {
            AnalyzeError::Quota(message)
        }
        (StatusCode::BAD_REQUEST, _) => AnalyzeError::InvalidRequest(message),
        _ => AnalyzeError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn extract_answer(body: GenerateContentResponse) -> Result<String, AnalyzeError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AnalyzeError::EmptyResponse(format!("prompt blocked: {reason}")));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AnalyzeError::EmptyResponse("no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "empty text".to_string());
        return Err(AnalyzeError::EmptyResponse(reason));
    }

    Ok(text.to_string())
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
