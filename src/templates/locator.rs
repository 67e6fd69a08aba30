//! Expansion of package-relative template identifiers to absolute file names

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix marking an identifier that lives inside a registered package
pub const PACKAGE_PREFIX: &str = "EXT:";

/// Trait for turning an identifier into an absolute file name, allowing dependency injection
/// for testing
pub trait PackageLocator {
    /// Expand `path` to an absolute file name. `None` means the path cannot be
    /// expanded (for example an unknown package key).
    fn expand(&self, path: &str) -> Option<String>;

    /// Root directory of a registered package
    fn package_root(&self, key: &str) -> Option<PathBuf>;
}

/// Production implementation backed by a package-key to directory map
#[derive(Debug, Clone, Default)]
pub struct PackageMap {
    packages: HashMap<String, PathBuf>,
    site_root: Option<PathBuf>,
}

impl PackageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base directory that relative paths are resolved against
    pub fn with_site_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.site_root = Some(root.into());
        self
    }

    pub fn with_package<K: Into<String>, P: Into<PathBuf>>(mut self, key: K, root: P) -> Self {
        self.register(key, root);
        self
    }

    pub fn register<K: Into<String>, P: Into<PathBuf>>(&mut self, key: K, root: P) {
        self.packages.insert(key.into(), root.into());
    }

}

impl PackageLocator for PackageMap {
    fn expand(&self, path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }

        if let Some(rest) = path.strip_prefix(PACKAGE_PREFIX) {
            let (key, tail) = rest.split_once('/').unwrap_or((rest, ""));
            let Some(root) = self.packages.get(key) else {
                debug!("Unknown package '{}' in template path {}", key, path);
                return None;
            };
            let expanded = if tail.is_empty() {
                root.clone()
            } else {
                root.join(tail)
            };
            return Some(expanded.to_string_lossy().into_owned());
        }

        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return Some(path.to_string());
        }

        match &self.site_root {
            Some(root) => Some(root.join(candidate).to_string_lossy().into_owned()),
            None => Some(path.to_string()),
        }
    }

    fn package_root(&self, key: &str) -> Option<PathBuf> {
        self.packages.get(key).cloned()
    }
}

/// Locator that only accepts paths as given; used when no packages are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLocator;

impl PackageLocator for IdentityLocator {
    fn expand(&self, path: &str) -> Option<String> {
        if path.is_empty() || path.starts_with(PACKAGE_PREFIX) {
            None
        } else {
            Some(path.to_string())
        }
    }

    fn package_root(&self, _key: &str) -> Option<PathBuf> {
        None
    }
}
