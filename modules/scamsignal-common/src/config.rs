use std::env;
use std::path::PathBuf;

use tracing::info;

/// Application configuration loaded from environment variables.
/// Backend credentials are NOT configured here; they live in the credential
/// store and are managed through the registry at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the credential and report files.
    pub data_dir: PathBuf,

    // Per-provider model ids
    pub claude_model: String,
    pub openai_model: String,
    pub openrouter_model: String,

    /// BCP-47 tag for the language backends should reply in.
    pub reply_language: String,

    /// Per-request timeout for backend calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables. Everything has a
    /// default; a missing variable never panics here.
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("SCAMSIGNAL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".scamsignal")),
            claude_model: env::var("SCAMSIGNAL_CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-haiku-4-5-20251001".to_string()),
            openai_model: env::var("SCAMSIGNAL_OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openrouter_model: env::var("SCAMSIGNAL_OPENROUTER_MODEL")
                .unwrap_or_else(|_| "anthropic/claude-3.5-haiku".to_string()),
            reply_language: env::var("SCAMSIGNAL_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
            request_timeout_secs: env::var("SCAMSIGNAL_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }

    pub fn reports_path(&self) -> PathBuf {
        self.data_dir.join("reports.json")
    }

    /// Log the effective configuration. Nothing here is secret, but keep this
    /// the single place that prints config so it stays that way.
    pub fn log_redacted(&self) {
        info!(
            data_dir = %self.data_dir.display(),
            claude_model = self.claude_model.as_str(),
            openai_model = self.openai_model.as_str(),
            openrouter_model = self.openrouter_model.as_str(),
            reply_language = self.reply_language.as_str(),
            request_timeout_secs = self.request_timeout_secs,
            "Loaded configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_env() {
        let config = Config::from_env();
        assert_eq!(config.reply_language, "en");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.credentials_path().ends_with("credentials.json"));
    }
}
