//! Configuration file and environment overrides

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::mail::BodyFormat;
use crate::templates::PackageMap;

pub const ENV_TEMPLATE_ROOTS: &str = "TEMPLATED_MAIL_TEMPLATE_ROOTS";
pub const ENV_SITE_ROOT: &str = "TEMPLATED_MAIL_SITE_ROOT";
pub const ENV_SMTP_PASSWORD: &str = "TEMPLATED_MAIL_SMTP_PASSWORD";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Trait for reading configuration overrides, allowing dependency injection for testing
pub trait ConfigReader {
    /// Template root paths separated by commas or newlines
    fn template_roots(&self) -> Option<String>;
    fn site_root(&self) -> Option<String>;
    fn smtp_password(&self) -> Option<String>;
}

/// Production implementation that reads from environment variables
pub struct EnvConfigReader;

impl ConfigReader for EnvConfigReader {
    fn template_roots(&self) -> Option<String> {
        std::env::var(ENV_TEMPLATE_ROOTS).ok()
    }

    fn site_root(&self) -> Option<String> {
        std::env::var(ENV_SITE_ROOT).ok()
    }

    fn smtp_password(&self) -> Option<String> {
        std::env::var(ENV_SMTP_PASSWORD).ok()
    }
}

/// TLS mode for SMTP delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    Starttls,
    Tls,
    None,
}

/// Transport used to deliver rendered messages
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    Smtp {
        host: String,
        #[serde(default)]
        port: Option<u16>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        tls: SmtpTls,
    },
    File {
        dir: PathBuf,
    },
    Stub,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::File {
            dir: PathBuf::from("outbox"),
        }
    }
}

/// Defaults applied to every outgoing message
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageDefaults {
    pub from: Option<String>,
    pub reply_to: Option<String>,
    pub subject: Option<String>,
    pub content_type: BodyFormat,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Base directory for relative template paths
    pub site_root: Option<PathBuf>,
    /// Ordered template roots; entries may use the `EXT:` package prefix
    pub template_root_paths: Vec<String>,
    pub partial_root_paths: Vec<PathBuf>,
    /// Package key to package root directory
    pub packages: HashMap<String, PathBuf>,
    pub mail: MessageDefaults,
    pub transport: TransportConfig,
}

impl MailConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` when given, otherwise start from defaults; then apply overrides
    pub fn load(path: Option<&Path>, reader: &dyn ConfigReader) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(reader);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, reader: &dyn ConfigReader) {
        if let Some(roots) = reader.template_roots() {
            self.template_root_paths = split_roots(&roots);
            debug!("Template roots overridden: {:?}", self.template_root_paths);
        }

        if let Some(root) = reader.site_root() {
            self.site_root = Some(PathBuf::from(root));
        }

        if let Some(secret) = reader.smtp_password() {
            if let TransportConfig::Smtp { password, .. } = &mut self.transport {
                *password = Some(secret);
            }
        }
    }

    /// Package locator for the configured packages and site root
    pub fn package_map(&self) -> PackageMap {
        let mut map = PackageMap::new();
        if let Some(root) = &self.site_root {
            map = map.with_site_root(root);
        }
        for (key, root) in &self.packages {
            map.register(key, root);
        }
        map
    }
}

/// Split a comma or newline separated root list, keeping `EXT:` prefixes intact
fn split_roots(roots: &str) -> Vec<String> {
    roots
        .split([',', '\n'])
        .map(str::trim)
        .filter(|root| !root.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub struct MockConfigReader {
    pub template_roots: Option<String>,
    pub site_root: Option<String>,
    pub smtp_password: Option<String>,
}

#[cfg(test)]
impl ConfigReader for MockConfigReader {
    fn template_roots(&self) -> Option<String> {
        self.template_roots.clone()
    }

    fn site_root(&self) -> Option<String> {
        self.site_root.clone()
    }

    fn smtp_password(&self) -> Option<String> {
        self.smtp_password.clone()
    }
}
