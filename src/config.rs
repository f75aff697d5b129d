//! Loading and validation of the service configuration.
//!
//! The configuration lives in a YAML document whose `server` section holds the
//! upload limits, the storage directory, the public URL prefix and the shared
//! token. Environment variables prefixed with `IMGDROP_` override the file.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::consts;

/// Errors raised while building a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("invalid value {value:?} for {key}")]
    Override { key: String, value: String },

    #[error("MaxFileSize of {0} MB does not fit in bytes")]
    Overflow(u64),
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    server: ServerSection,
}

/// Raw `server` section, named the way the YAML file spells its keys.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
struct ServerSection {
    #[validate(range(min = 1))]
    max_file_size: u64,

    #[validate(length(min = 1))]
    upload_path: String,

    #[serde(alias = "HttpUlr")]
    #[validate(length(min = 1))]
    http_url: String,

    #[validate(length(min = 1))]
    token: String,

    #[serde(default = "default_allowed_exts")]
    #[validate(length(min = 1), custom(function = "validate_extensions"))]
    allowed_exts: Vec<String>,

    #[serde(default = "default_port")]
    port: u16,

    #[serde(default = "default_static_route")]
    #[validate(custom(function = "validate_route"))]
    static_route: String,
}

fn default_allowed_exts() -> Vec<String> {
    consts::ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_port() -> u16 {
    consts::HTTP_PORT
}

fn default_static_route() -> String {
    consts::STATIC_ROUTE.to_string()
}

fn validate_extensions(exts: &[String]) -> Result<(), ValidationError> {
    if exts.iter().all(|ext| ext.starts_with('.') && ext.len() > 1) {
        Ok(())
    } else {
        Err(ValidationError::new("extension_must_start_with_dot"))
    }
}

fn validate_route(route: &str) -> Result<(), ValidationError> {
    if route.starts_with('/') && route.len() > 1 && !route.ends_with('/') {
        Ok(())
    } else {
        Err(ValidationError::new("static_route_invalid"))
    }
}

/// Fully validated configuration, shared read-only between requests.
#[derive(Clone)]
pub struct Config {
    /// Upper bound on an accepted upload, in bytes.
    pub max_file_size: u64,
    pub allowed_exts: HashSet<String>,
    pub upload_path: PathBuf,
    /// Prepended to the stored file name to build the returned URL.
    pub public_url_prefix: String,
    pub token: String,
    pub port: u16,
    pub static_route: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_file_size", &self.max_file_size)
            .field("allowed_exts", &self.allowed_exts)
            .field("upload_path", &self.upload_path)
            .field("public_url_prefix", &self.public_url_prefix)
            .field("token", &"<redacted>")
            .field("port", &self.port)
            .field("static_route", &self.static_route)
            .finish()
    }
}

impl Config {
    /// Reads the YAML file at `path` and applies environment overrides.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_yaml_with(&raw, |key| std::env::var(key).ok())
    }

    /// Builds a configuration from YAML text alone, ignoring the environment.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_with(raw, |_| None)
    }

    fn from_yaml_with<F>(raw: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ConfigFile { mut server } = serde_yaml::from_str(raw)?;
        apply_overrides(&mut server, lookup)?;
        server.validate()?;

        let max_file_size = server
            .max_file_size
            .checked_mul(consts::BYTES_PER_MB)
            .ok_or(ConfigError::Overflow(server.max_file_size))?;

        if Url::parse(&server.http_url).is_err() {
            warn!(
                "HttpUrl {:?} is not an absolute URL, returned links will be relative",
                server.http_url
            );
        }

        Ok(Self {
            max_file_size,
            allowed_exts: server.allowed_exts.into_iter().collect(),
            upload_path: PathBuf::from(server.upload_path),
            public_url_prefix: server.http_url,
            token: server.token,
            port: server.port,
            static_route: server.static_route,
        })
    }
}

fn apply_overrides<F>(server: &mut ServerSection, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| {
        let key = format!("{}{}", consts::ENV_PREFIX, name);
        lookup(&key).map(|value| (key, value))
    };

    if let Some((key, value)) = var("MAX_FILE_SIZE") {
        server.max_file_size = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Override { key, value })?;
    }
    if let Some((key, value)) = var("PORT") {
        server.port = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Override { key, value })?;
    }
    if let Some((_, value)) = var("UPLOAD_PATH") {
        server.upload_path = value;
    }
    if let Some((_, value)) = var("HTTP_URL") {
        server.http_url = value;
    }
    if let Some((_, value)) = var("TOKEN") {
        server.token = value;
    }

    Ok(())
}

/// Where the upload handler gets its configuration from.
#[derive(Debug, Clone)]
pub enum ConfigProvider {
    /// Loaded once at start-up.
    Fixed(Arc<Config>),
    /// Re-read from this file for every request.
    Reload(PathBuf),
}

impl ConfigProvider {
    pub async fn current(&self) -> Result<Arc<Config>, ConfigError> {
        match self {
            Self::Fixed(config) => Ok(Arc::clone(config)),
            Self::Reload(path) => Config::load(path).await.map(Arc::new),
        }
    }
}
