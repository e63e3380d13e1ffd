use std::fmt;

use serde::Serialize;

use crate::{ConfigError, Lookup};

pub const DEFAULT_PROMPT: &str = concat!(
    "Analyze this image and give a concise answer to the question it contains, ",
    "without elaboration:"
);

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

#[derive(Serialize, Clone)]
pub struct AnalyzerConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub prompt: String,
}

impl AnalyzerConfig {
    pub(crate) fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env.required("GEMINI_API_KEY")?,
            model: env.required("GEMINI_MODEL")?,
            api_url: env
                .get("GEMINI_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(default_api_url),
            prompt: env.get("ANALYZER_PROMPT").unwrap_or_else(default_prompt),
        })
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("prompt", &self.prompt)
            .finish()
    }
}
