//! Assistant configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required for chat and evaluation
//! - `CLAUDE_API_KEY` - Anthropic Claude API key
//!
//! ## Optional
//! - `WEBSHOP_DATA_DIR` - Directory holding the catalogue files (default: data)
//! - `WEBSHOP_NUM_PRODUCTS` - Products to load, 0 for all (default: 1000)
//! - `WEBSHOP_CATALOGUE_FILE` - Explicit catalogue file, bypasses size-based selection
//! - `WEBSHOP_BASE_URL` - Origin used in page URLs (default: <http://127.0.0.1:3000>)
//! - `PAYMENT_QR_PATH` - Payment QR image (default: `qr_payments/qr1.jpg`)
//! - `ARTIFACT_DIR` - Write artifacts to this directory instead of memory
//! - `CLAUDE_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::SecretString;
use shopping_assistant_webshop::catalogue::DEFAULT_NUM_PRODUCTS;
use shopping_assistant_webshop::{CatalogueConfig, DEFAULT_BASE_URL, normalise_base_url};
use thiserror::Error;

use crate::payment::DEFAULT_PAYMENT_QR_PATH;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_DATA_DIR: &str = "data";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Variable lookup, `std::env::var` outside tests.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Assistant application configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Catalogue location and size
    pub catalogue: CatalogueConfig,
    /// Origin used in simulated page URLs
    pub base_url: String,
    /// Payment QR image shown at checkout
    pub payment_qr_path: PathBuf,
    /// Directory for UI artifacts (in-memory store when unset)
    pub artifact_dir: Option<PathBuf>,
    /// Claude API configuration (absent when no API key is set)
    pub claude: Option<ClaudeConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Claude AI API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl AssistantConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or if the API key fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let num_products = get_optional_env(env, "WEBSHOP_NUM_PRODUCTS")
            .map(|value| {
                value.trim().parse::<usize>().map_err(|e| {
                    ConfigError::InvalidEnvVar("WEBSHOP_NUM_PRODUCTS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_NUM_PRODUCTS);

        let catalogue = CatalogueConfig {
            data_dir: PathBuf::from(get_env_or_default(env, "WEBSHOP_DATA_DIR", DEFAULT_DATA_DIR)),
            num_products,
            file_override: get_optional_env(env, "WEBSHOP_CATALOGUE_FILE").map(PathBuf::from),
        };

        let base_url = get_env_or_default(env, "WEBSHOP_BASE_URL", DEFAULT_BASE_URL);
        let base_url = normalise_base_url(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("WEBSHOP_BASE_URL".to_string(), e.to_string())
        })?;

        let claude = get_optional_env(env, "CLAUDE_API_KEY")
            .map(|api_key| ClaudeConfig::new(env, api_key))
            .transpose()?;

        Ok(Self {
            catalogue,
            base_url,
            payment_qr_path: PathBuf::from(get_env_or_default(
                env,
                "PAYMENT_QR_PATH",
                DEFAULT_PAYMENT_QR_PATH,
            )),
            artifact_dir: get_optional_env(env, "ARTIFACT_DIR").map(PathBuf::from),
            claude,
            sentry_dsn: get_optional_env(env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Claude configuration, required by commands that talk to the model.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when `CLAUDE_API_KEY` is not set.
    pub fn claude(&self) -> Result<&ClaudeConfig, ConfigError> {
        self.claude
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("CLAUDE_API_KEY".to_string()))
    }
}

impl ClaudeConfig {
    fn new(env: Lookup<'_>, api_key: String) -> Result<Self, ConfigError> {
        validate_secret_strength(&api_key, "CLAUDE_API_KEY")?;
        Ok(Self {
            api_key: SecretString::from(api_key),
            model: get_env_or_default(env, "CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(env: Lookup<'_>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: Lookup<'_>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const API_KEY: &str = "sk-ant-REDACTED";

    fn load(vars: &[(&str, &str)]) -> Result<AssistantConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AssistantConfig::from_lookup(&|key: &str| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).expect("config");
        assert_eq!(config.catalogue.data_dir, PathBuf::from("data"));
        assert_eq!(config.catalogue.num_products, 1000);
        assert_eq!(config.catalogue.file_override, None);
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.payment_qr_path, PathBuf::from("qr_payments/qr1.jpg"));
        assert!(config.artifact_dir.is_none());
        assert!(config.claude.is_none());
        assert!(matches!(config.claude(), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WEBSHOP_DATA_DIR", "/srv/webshop"),
            ("WEBSHOP_NUM_PRODUCTS", "50000"),
            ("WEBSHOP_CATALOGUE_FILE", "/srv/items.json"),
            ("ARTIFACT_DIR", "/tmp/artifacts"),
            ("CLAUDE_API_KEY", API_KEY),
            ("CLAUDE_MODEL", "claude-test"),
        ])
        .expect("config");

        assert_eq!(config.catalogue.num_products, 50_000);
        assert_eq!(
            config.catalogue.file_override,
            Some(PathBuf::from("/srv/items.json"))
        );
        let claude = config.claude().expect("claude");
        assert_eq!(claude.api_key.expose_secret(), API_KEY);
        assert_eq!(claude.model, "claude-test");
    }

    #[test]
    fn test_invalid_product_count() {
        let result = load(&[("WEBSHOP_NUM_PRODUCTS", "lots")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = load(&[("WEBSHOP_BASE_URL", "localhost:3000")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_base_url_with_path_rejected() {
        let result = load(&[("WEBSHOP_BASE_URL", "http://127.0.0.1:3000/shop")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar(name, _)) if name == "WEBSHOP_BASE_URL"
        ));

        let config = load(&[("WEBSHOP_BASE_URL", "http://shop.test/")]).expect("config");
        assert_eq!(config.base_url, "http://shop.test");
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let result = load(&[("CLAUDE_API_KEY", "your-api-key-here")]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_low_entropy_api_key_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClaudeConfig {
            api_key: SecretString::from(API_KEY),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(API_KEY));
    }
}
