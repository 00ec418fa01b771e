use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "learning-assistant";
const API_ENV: &str = "LEARNING_ASSISTANT_API";

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_token_env() -> String {
    "LEARNING_ASSISTANT_TOKEN".to_string()
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// When set, requests need a token from `token` or `token_env`.
    pub required: bool,
    pub token: Option<String>,
    pub token_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            required: false,
            token: None,
            token_env: default_token_env(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("required", &self.required)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 1100,
            height: 760,
            min_width: 640,
            min_height: 480,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        let mut config = if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                    tracing::warn!(path = %config_path.display(), "Error parsing config.toml: {}. Using defaults.", e);
                    Config::default()
                }),
                Err(e) => {
                    tracing::warn!(path = %config_path.display(), "Error reading config.toml: {}. Using defaults.", e);
                    Config::default()
                }
            }
        } else {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            Config::default()
        };

        if let Ok(base_url) = std::env::var(API_ENV) {
            if !base_url.trim().is_empty() {
                config.backend.base_url = base_url;
            }
        }

        config
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn get_config_path() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config").join(APP_DIR).join("config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert!(!config.auth.required);
        assert_eq!(config.auth.token_env, "LEARNING_ASSISTANT_TOKEN");
        assert_eq!(config.window.width, 1100);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [backend]
            base_url = "https://research.example.com"

            [auth]
            required = true

            [window]
            width = 900
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "https://research.example.com");
        assert!(config.auth.required);
        assert!(config.auth.token.is_none());
        assert_eq!(config.window.width, 900);
        assert_eq!(config.window.height, 760);
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let config = Config::parse("[auth]\ntoken = \"secret-value\"").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-value"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("[backend\nbase_url =").is_err());
    }
}
