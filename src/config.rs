use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub model: ModelConfig,
    pub email: EmailConfig,
    pub ledger: LedgerConfig,
}

/// Document registry query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub agency_id: String,
    pub term: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.federalregister.gov".to_string(),
            // FDA
            agency_id: "170".to_string(),
            term: "approval OR investigational".to_string(),
        }
    }
}

/// Which inference backend classifies notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Gemini,
    OpenAi,
}

impl ModelProvider {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ModelProvider::Gemini => "GEMINI_API_KEY",
            ModelProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    pub name: String,
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Gemini,
            name: "gemini-2.0-flash".to_string(),
            base_url: None,
            temperature: 0.1,
        }
    }
}

/// Email delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub base_url: String,
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.resend.com".to_string(),
            from: "FDA-Agent <onboarding@resend.dev>".to_string(),
        }
    }
}

/// Ledger file location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("drug_approvals.csv"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }
}

/// Secrets and recipient taken from the process environment
#[derive(Clone)]
pub struct Credentials {
    pub model_api_key: String,
    pub email_api_key: String,
    pub recipient: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &"<redacted>")
            .field("email_api_key", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl Credentials {
    pub fn from_env(provider: ModelProvider) -> Result<Self> {
        Self::from_lookup(provider, |key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable lookup
    pub fn from_lookup(
        provider: ModelProvider,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} not set", key))
        };

        Ok(Self {
            model_api_key: require(provider.api_key_var())?,
            email_api_key: require("RESEND_API_KEY")?,
            recipient: require("MY_EMAIL")?,
        })
    }
}
