//! Service configuration loaded from a TOML file.
//!
//! Lookup order: `--config <path>`, then `./config.toml`, then
//! `<config dir>/geocode-relay/config.toml`. A `--port` flag overrides
//! `server_port` from the file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::geocode::{
    FallbackGeocoder, FallbackPolicy, GeocodeProvider, GoogleProvider, HereProvider,
    DEFAULT_TIMEOUT_SECS,
};

const DEFAULT_FILE_NAME: &str = "config.toml";

/// Startup configuration errors. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file doesn't exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file, please check for proper format: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("primary provider not provided")]
    MissingPrimary,
    #[error("server port not provided")]
    MissingPort,
    #[error("unknown provider '{0}', expected 'google' or 'here'")]
    UnknownProvider(String),
    #[error("provider '{0}' selected but its [provider.{0}] section is missing")]
    MissingCredentials(ProviderKind),
    #[error("remote_timeout must be at least 1 second")]
    ZeroTimeout,
}

/// Which backend a provider selector names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Here,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "here" | "heremaps" => Ok(Self::Here),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Here => write!(f, "here"),
        }
    }
}

// ─── File schema ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FileConfig {
    server_port: Option<u16>,
    #[serde(default = "default_timeout")]
    remote_timeout: u64,
    primary_provider: Option<String>,
    secondary_provider: Option<String>,
    #[serde(default)]
    fallback_on_not_found: bool,
    #[serde(default)]
    provider: ProviderSections,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProviderSections {
    google: Option<GoogleSection>,
    here: Option<HereSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct GoogleSection {
    api_key: String,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct HereSection {
    app_id: String,
    app_code: String,
    base_url: Option<String>,
}

// ─── Validated settings ─────────────────────────────────────────

/// Validated service settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub timeout: Duration,
    pub primary: ProviderKind,
    pub secondary: Option<ProviderKind>,
    pub policy: FallbackPolicy,
    providers: ProviderSections,
}

impl Settings {
    /// Locate, read and validate the config file.
    pub fn load(explicit: Option<&Path>, port_override: Option<u16>) -> Result<Self, ConfigError> {
        let user_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::load_from(explicit, Path::new("."), &user_dir, port_override)
    }

    /// Like [`Settings::load`], with explicit lookup roots (for testing).
    pub fn load_from(
        explicit: Option<&Path>,
        cwd: &Path,
        user_dir: &Path,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let path = resolve_path(explicit, cwd, user_dir)?;
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "using config file");
        Self::parse(&contents, port_override)
    }

    /// Validate settings from TOML text.
    pub fn parse(contents: &str, port_override: Option<u16>) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(contents)?;

        let port = port_override
            .or(file.server_port)
            .filter(|p| *p != 0)
            .ok_or(ConfigError::MissingPort)?;

        if file.remote_timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let primary = selector(file.primary_provider.as_deref())
            .ok_or(ConfigError::MissingPrimary)?
            .parse::<ProviderKind>()?;
        let secondary = selector(file.secondary_provider.as_deref())
            .map(str::parse::<ProviderKind>)
            .transpose()?;

        let policy = if file.fallback_on_not_found {
            FallbackPolicy::RetryOnNotFound
        } else {
            FallbackPolicy::AuthoritativeNotFound
        };

        let settings = Self {
            port,
            timeout: Duration::from_secs(file.remote_timeout),
            primary,
            secondary,
            policy,
            providers: file.provider,
        };

        // Fail at startup, not at the first request.
        settings.require_credentials(primary)?;
        if let Some(kind) = secondary {
            settings.require_credentials(kind)?;
        }

        Ok(settings)
    }

    /// Build the fallback geocoder described by these settings.
    pub fn build_geocoder(&self) -> Result<FallbackGeocoder, ConfigError> {
        info!(port = self.port, timeout_secs = self.timeout.as_secs(), "loaded settings");

        let mut geocoder = FallbackGeocoder::new(self.make_provider(self.primary)?)
            .with_policy(self.policy);

        match self.secondary {
            Some(kind) => geocoder = geocoder.with_secondary(self.make_provider(kind)?),
            None => warn!("secondary provider not provided, fallback will not be used"),
        }

        Ok(geocoder)
    }

    fn require_credentials(&self, kind: ProviderKind) -> Result<(), ConfigError> {
        let present = match kind {
            ProviderKind::Google => self.providers.google.is_some(),
            ProviderKind::Here => self.providers.here.is_some(),
        };
        if present {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials(kind))
        }
    }

    fn make_provider(&self, kind: ProviderKind) -> Result<Arc<dyn GeocodeProvider>, ConfigError> {
        match kind {
            ProviderKind::Google => {
                let section = self
                    .providers
                    .google
                    .as_ref()
                    .ok_or(ConfigError::MissingCredentials(kind))?;
                let mut provider = GoogleProvider::new(section.api_key.clone(), self.timeout);
                if let Some(url) = &section.base_url {
                    provider = provider.with_base_url(url.clone());
                }
                Ok(Arc::new(provider))
            }
            ProviderKind::Here => {
                let section = self
                    .providers
                    .here
                    .as_ref()
                    .ok_or(ConfigError::MissingCredentials(kind))?;
                let mut provider =
                    HereProvider::new(section.app_id.clone(), section.app_code.clone(), self.timeout);
                if let Some(url) = &section.base_url {
                    provider = provider.with_base_url(url.clone());
                }
                Ok(Arc::new(provider))
            }
        }
    }
}

/// Treat blank selectors as absent.
fn selector(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_path(explicit: Option<&Path>, cwd: &Path, user_dir: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ConfigError::NotFound(path.to_path_buf()))
        };
    }

    let local = cwd.join(DEFAULT_FILE_NAME);
    if local.is_file() {
        return Ok(local);
    }

    let user = user_dir.join("geocode-relay").join(DEFAULT_FILE_NAME);
    if user.is_file() {
        Ok(user)
    } else {
        Err(ConfigError::NotFound(local))
    }
}
