//! Configuration types for cfsync
//!
//! A [`Config`] is built once at startup from three layers, highest
//! precedence first: explicit overrides (CLI flags / environment), the
//! `KEY=VALUE` config file, and built-in defaults. It is then validated and
//! handed to the transport and the engine; nothing reads credentials from
//! global state.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default zone-map file, relative to the working directory
pub const DEFAULT_ZONE_MAP_PATH: &str = "zone_map.txt";

/// Default credentials file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.txt";

/// Default HTTP timeout for API requests
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Resolved runtime configuration
#[derive(Clone)]
pub struct Config {
    /// Bearer token for the provider API
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Base URL of the provider API
    pub api_base: String,

    /// Path of the zone-map cache file
    pub zone_map_path: PathBuf,

    /// Whether the zone map is persisted to `zone_map_path`
    pub persist_zone_map: bool,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Perform lookups but skip every mutating call
    pub dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("zone_map_path", &self.zone_map_path)
            .field("persist_zone_map", &self.persist_zone_map)
            .field("timeout_secs", &self.timeout_secs)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Values supplied explicitly by the caller (flags or environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_token: Option<String>,
    pub api_base: Option<String>,
    pub zone_map_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub dry_run: bool,
    pub no_cache: bool,
}

/// Settings read from the `KEY=VALUE` credentials file
///
/// Recognised keys: `API_TOKEN` (or the older `API_KEY`), `EMAIL`,
/// `ZONE_MAP`, `API_BASE`. Blank lines and `#` comments are ignored.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FileSettings {
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub zone_map_path: Option<PathBuf>,
    pub api_base: Option<String>,
}

impl fmt::Debug for FileSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSettings")
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .field("email", &self.email)
            .field("zone_map_path", &self.zone_map_path)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl FileSettings {
    /// Parse the contents of a credentials file
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!("Ignoring config line {}: expected KEY=VALUE", lineno + 1);
                continue;
            };

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim() {
                "API_TOKEN" | "API_KEY" => settings.api_token = Some(value.to_string()),
                "EMAIL" => settings.email = Some(value.to_string()),
                "ZONE_MAP" => settings.zone_map_path = Some(PathBuf::from(value)),
                "API_BASE" => settings.api_base = Some(value.to_string()),
                other => tracing::warn!("Ignoring unknown config key '{}'", other),
            }
        }

        settings
    }

    /// Load a credentials file
    ///
    /// Returns `Ok(None)` when the file does not exist, so that a setup
    /// driven purely by environment variables needs no file at all.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::debug!("Loaded config file {}", path.display());
                Ok(Some(Self::parse(&text)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Config file {} not found", path.display());
                Ok(None)
            }
            Err(e) => Err(Error::config(format!(
                "Could not read configuration file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

impl Config {
    /// Merge overrides, file settings and defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, file: Option<FileSettings>) -> Result<Self> {
        let file = file.unwrap_or_default();

        if file.email.is_some() {
            tracing::debug!("EMAIL is set but unused: authentication uses the bearer token only");
        }

        let config = Self {
            api_token: overrides
                .api_token
                .or(file.api_token)
                .unwrap_or_default(),
            api_base: overrides
                .api_base
                .or(file.api_base)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            zone_map_path: overrides
                .zone_map_path
                .or(file.zone_map_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ZONE_MAP_PATH)),
            persist_zone_map: !overrides.no_cache,
            timeout_secs: overrides.timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            dry_run: overrides.dry_run,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::config(
                "API token is required. Set API_TOKEN in the config file or CFSYNC_API_TOKEN",
            ));
        }

        if self.api_token.chars().any(char::is_whitespace) {
            return Err(Error::config("API token must not contain whitespace"));
        }

        let token_lower = self.api_token.to_lowercase();
        if token_lower.contains("your_token") || token_lower.contains("replace_me") {
            return Err(Error::config(
                "API token appears to be a placeholder. Use an actual API token",
            ));
        }

        if !self.api_base.starts_with("https://") && !self.api_base.starts_with("http://") {
            return Err(Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                self.api_base
            )));
        }

        if !(1..=300).contains(&self.timeout_secs) {
            return Err(Error::config(format!(
                "HTTP timeout must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            )));
        }

        if self.persist_zone_map && self.zone_map_path.as_os_str().is_empty() {
            return Err(Error::config("Zone map path cannot be empty"));
        }

        Ok(())
    }

    /// API base without a trailing slash, ready for path concatenation
    pub fn api_base_trimmed(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}
