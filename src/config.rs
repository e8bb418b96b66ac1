//! Configuration loading and endpoint selection.
//!
//! Settings come from `~/.idea-improver/config.toml`; every field is optional.
//! The endpoint is either a directly addressed backend (`<api_url>/improve`)
//! or the site's same-origin proxy path (`<site_url>/api/improve`). An API URL
//! from the command line, then `IDEA_IMPROVER_API_URL`, then the config file
//! selects the direct form; without one the proxy form is used.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::client::ResponseMode;
use crate::idea::TextDirection;

/// Environment variable naming the backend origin.
pub const API_URL_ENV: &str = "IDEA_IMPROVER_API_URL";

/// Site origin used for the proxy path when nothing else is configured.
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
}

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Backend origin, e.g. `http://localhost:8000`.
    pub api_url: Option<String>,
    /// Site origin serving the `/api/improve` proxy.
    pub site_url: Option<String>,
    pub mode: Option<ResponseMode>,
    /// Typing effect on/off.
    pub typing: Option<bool>,
    /// Output width for right-to-left alignment.
    pub width: Option<usize>,
    /// Force the output direction instead of detecting it.
    pub direction: Option<TextDirection>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Pick the endpoint: CLI override, then the environment, then the file.
    pub fn endpoint(&self, api_url_override: Option<&str>) -> Result<Endpoint, ConfigError> {
        resolve_endpoint(api_url_override, std::env::var(API_URL_ENV).ok(), self)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.timeout_secs
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs)
    }
}

/// Default config file location.
pub fn config_path() -> Option<PathBuf> {
    home::home_dir().map(|mut p| {
        p.push(".idea-improver");
        p.push("config.toml");
        p
    })
}

/// Load the default config file, falling back to defaults.
pub fn load_config() -> Config {
    config_path()
        .map(|p| load_config_from(&p))
        .unwrap_or_default()
}

/// Load a config file. Missing or unreadable files yield defaults.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("ignoring invalid config {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Endpoint resolution with the environment value passed in.
pub fn resolve_endpoint(
    api_url_override: Option<&str>,
    env_api_url: Option<String>,
    config: &Config,
) -> Result<Endpoint, ConfigError> {
    let api_url = api_url_override
        .map(str::to_string)
        .or(env_api_url)
        .or_else(|| config.api_url.clone())
        .filter(|u| !u.trim().is_empty());

    match api_url {
        Some(url) => Endpoint::direct(&url),
        None => Endpoint::proxy(config.site_url.as_deref().unwrap_or(DEFAULT_SITE_URL)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Backend addressed directly (development).
    Direct,
    /// Same-origin proxy path (deployed site).
    Proxy,
}

/// Where the idea is posted, plus the matching health route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    kind: EndpointKind,
    improve: Url,
    health: Url,
}

impl Endpoint {
    /// `<api_url>/improve`, health at `<api_url>/health`.
    pub fn direct(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: EndpointKind::Direct,
            improve: append_path(api_url, "improve")?,
            health: append_path(api_url, "health")?,
        })
    }

    /// `<site_url>/api/improve`, health at `<site_url>/api/health`.
    pub fn proxy(site_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: EndpointKind::Proxy,
            improve: append_path(site_url, "api/improve")?,
            health: append_path(site_url, "api/health")?,
        })
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn improve_url(&self) -> &Url {
        &self.improve
    }

    pub fn health_url(&self) -> &Url {
        &self.health
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.improve.as_str())
    }
}

/// Plain concatenation, so a base path prefix is kept.
fn append_path(base: &str, path: &str) -> Result<Url, ConfigError> {
    let joined = format!("{}/{path}", base.trim().trim_end_matches('/'));
    let url = Url::parse(&joined).map_err(|source| ConfigError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
