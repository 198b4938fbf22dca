use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::errors::ApiError;

/// Process configuration, read once at startup.
///
/// Every required key must be present or startup aborts with a
/// `CONFIG_ERROR`; running with a degraded subset of services is not an
/// option because every request needs all three upstreams.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    pub pinecone_namespace: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub simple_model: String,
    pub embedding_model: String,
    pub trusted_urls_path: PathBuf,
    pub allowed_origins: Vec<String>,
    pub port: u16,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary lookup so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ApiError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::Config(format!("missing required setting {key}")))
        };
        let optional = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let port = optional("PORT", "8080")
            .parse::<u16>()
            .map_err(|_| ApiError::Config("PORT must be a valid port number".into()))?;

        let timeout_secs = optional("REQUEST_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|_| ApiError::Config("REQUEST_TIMEOUT_SECS must be an integer".into()))?;

        Ok(Settings {
            pinecone_api_key: required("PINECONE_API_KEY")?,
            pinecone_index_host: required("PINECONE_INDEX_HOST")?,
            pinecone_namespace: optional("PINECONE_NAMESPACE", "default"),
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: optional("OPENAI_BASE_URL", "https://api.openai.com"),
            chat_model: optional("CHAT_MODEL", "gpt-4o"),
            simple_model: optional("SIMPLE_MODEL", "gpt-4o-mini"),
            embedding_model: optional("EMBEDDING_MODEL", "text-embedding-3-small"),
            trusted_urls_path: PathBuf::from(optional("TRUSTED_URLS_PATH", "trusted_urls.txt")),
            allowed_origins,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            log_dir: PathBuf::from(optional("LOG_DIR", "logs")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env(key: &str) -> Option<String> {
        match key {
            "PINECONE_API_KEY" => Some("pk-test".into()),
            "PINECONE_INDEX_HOST" => Some("https://idx.example.net".into()),
            "OPENAI_API_KEY" => Some("sk-test".into()),
            _ => None,
        }
    }

    #[test]
    fn loads_with_required_keys_and_defaults() {
        let settings = Settings::from_lookup(base_env).unwrap();
        assert_eq!(settings.pinecone_namespace, "default");
        assert_eq!(settings.chat_model, "gpt-4o");
        assert_eq!(settings.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_required_key_fails_fast_with_config_error() {
        let err = Settings::from_lookup(|key| match key {
            "OPENAI_API_KEY" => None,
            other => base_env(other),
        })
        .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn blank_required_key_counts_as_missing() {
        let err = Settings::from_lookup(|key| match key {
            "PINECONE_API_KEY" => Some("   ".into()),
            other => base_env(other),
        })
        .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn allowed_origins_splits_on_commas() {
        let settings = Settings::from_lookup(|key| match key {
            "ALLOWED_ORIGINS" => Some("http://localhost:3000, https://app.example.com".into()),
            other => base_env(other),
        })
        .unwrap();
        assert_eq!(
            settings.allowed_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let err = Settings::from_lookup(|key| match key {
            "PORT" => Some("not-a-port".into()),
            other => base_env(other),
        })
        .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
