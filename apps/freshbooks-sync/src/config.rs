use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use freshbooks_client::{
    BusinessId, ClientConfig, Credentials, DEFAULT_BASE_URL, DEFAULT_PER_PAGE, MAX_PER_PAGE,
};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides; nested keys use `__`, e.g.
/// `FRESHBOOKS_CREDENTIALS__TOKEN`.
pub const ENV_PREFIX: &str = "FRESHBOOKS_";

/// Effective application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub credentials: CredentialsConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Either `token`, or all of `refresh_token`, `client_id` and
/// `client_secret`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("CredentialsConfig")
            .field("token", &redact(&self.token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Team members fetched per request (1..=100).
    pub page_size: u32,
    /// Per-request timeout; unset means no timeout.
    pub request_timeout_secs: Option<u64>,
    /// Known business id; skips the `users/me` lookup.
    pub business_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            page_size: DEFAULT_PER_PAGE,
            request_timeout_secs: None,
            business_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File receiving the JSON lines; stdout when unset.
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Layered load: defaults, YAML file, `FRESHBOOKS_*` environment, then
    /// `overrides` (from the command line).
    ///
    /// # Errors
    /// Returns an error if the file is missing, a layer fails to parse or
    /// the merged result is invalid.
    pub fn load(file: Option<&Path>, overrides: &serde_json::Value) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides))
            .extract()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that need no network access.
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 || self.api.page_size > MAX_PER_PAGE {
            anyhow::bail!(
                "api.page_size must be between 1 and {MAX_PER_PAGE}, got {}",
                self.api.page_size
            );
        }
        self.credentials()?;
        self.client_config()?;
        Ok(())
    }

    /// Credentials selected from the configured values.
    ///
    /// # Errors
    /// Returns an error when neither a token nor a full refresh-token triple
    /// is configured.
    pub fn credentials(&self) -> Result<Credentials> {
        let c = &self.credentials;
        Ok(Credentials::from_parts(
            c.token.as_deref(),
            c.refresh_token.as_deref(),
            c.client_id.as_deref(),
            c.client_secret.as_deref(),
        )?)
    }

    /// Client settings derived from the `api` section.
    ///
    /// # Errors
    /// Returns an error if `api.base_url` is not a valid URL.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::with_base_url(&self.api.base_url)
            .with_context(|| format!("invalid api.base_url '{}'", self.api.base_url))?;
        config.request_timeout = self.api.request_timeout_secs.map(Duration::from_secs);
        Ok(config)
    }

    #[must_use]
    pub fn business_id(&self) -> Option<BusinessId> {
        self.api
            .business_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(BusinessId::new)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;
    use serde_json::json;

    #[test]
    fn defaults_need_credentials() {
        Jail::expect_with(|_jail| {
            let err = AppConfig::load(None, &json!({})).unwrap_err();
            assert!(format!("{err:#}").contains("must be provided"));
            Ok(())
        });
    }

    #[test]
    fn layers_apply_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "sync.yaml",
                r"
credentials:
  token: from-file
api:
  page_size: 20
logging:
  level: debug
",
            )?;
            jail.set_env("FRESHBOOKS_API__PAGE_SIZE", "30");
            jail.set_env("FRESHBOOKS_LOGGING__JSON", "true");

            let config = AppConfig::load(
                Some(Path::new("sync.yaml")),
                &json!({"api": {"page_size": 40}}),
            )
            .unwrap();

            assert_eq!(config.credentials.token.as_deref(), Some("from-file"));
            assert_eq!(config.api.page_size, 40);
            assert_eq!(config.logging.level, "debug");
            assert!(config.logging.json);
            assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
            Ok(())
        });
    }

    #[test]
    fn env_supplies_refresh_credentials() {
        Jail::expect_with(|jail| {
            jail.set_env("FRESHBOOKS_CREDENTIALS__REFRESH_TOKEN", "rt");
            jail.set_env("FRESHBOOKS_CREDENTIALS__CLIENT_ID", "cid");
            jail.set_env("FRESHBOOKS_CREDENTIALS__CLIENT_SECRET", "sec");

            let config = AppConfig::load(None, &json!({})).unwrap();
            assert!(matches!(
                config.credentials().unwrap(),
                Credentials::Refreshable { .. }
            ));
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("sync.yaml", "api:\n  pagesize: 10\n")?;
            assert!(AppConfig::load(Some(Path::new("sync.yaml")), &json!({})).is_err());
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/sync.yaml")), &json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn page_size_out_of_range_is_rejected() {
        let mut config = AppConfig::default();
        config.credentials.token = Some("tok".into());
        config.api.page_size = 101;
        assert!(config.validate().is_err());
        config.api.page_size = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn timeout_and_business_id_are_mapped() {
        let mut config = AppConfig::default();
        config.api.request_timeout_secs = Some(15);
        config.api.business_id = Some(" 42 ".into());

        assert_eq!(
            config.client_config().unwrap().request_timeout,
            Some(Duration::from_secs(15))
        );
        assert_eq!(config.business_id().unwrap().as_str(), "42");
    }

    #[test]
    fn debug_hides_secrets() {
        let creds = CredentialsConfig {
            token: Some("tok-value".into()),
            client_id: Some("cid".into()),
            ..CredentialsConfig::default()
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("tok-value"));
        assert!(dbg.contains("cid"));
    }
}
