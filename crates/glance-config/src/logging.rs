use serde::Serialize;

use crate::Lookup;

fn default_file() -> String {
    "glance.log".to_string()
}

fn default_level() -> String {
    "INFO".to_string()
}

fn default_max_bytes() -> u64 {
    1_000_000
}

fn default_backups() -> usize {
    3
}

fn default_response_log() -> String {
    "gemini_responses.log".to_string()
}

#[derive(Debug, Serialize, Clone)]
pub struct LogConfig {
    /// Rotating operational log
    pub file: String,
    pub level: String,
    pub max_bytes: u64,
    pub backups: usize,
    /// Append-only log of every answer
    pub response_log: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_file(),
            level: default_level(),
            max_bytes: default_max_bytes(),
            backups: default_backups(),
            response_log: default_response_log(),
        }
    }
}

impl LogConfig {
    pub(crate) fn from_lookup(env: &Lookup<'_>) -> Self {
        Self {
            file: env.get("LOG_FILE").unwrap_or_else(default_file),
            level: env
                .get("LOG_LEVEL")
                .map(|level| level.to_ascii_uppercase())
                .unwrap_or_else(default_level),
            response_log: env.get("RESPONSE_LOG").unwrap_or_else(default_response_log),
            ..Self::default()
        }
    }

    /// `tracing` filter directive for the configured level; unknown names mean INFO
    pub fn level_directive(&self) -> &'static str {
        match self.level.to_ascii_uppercase().as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}
