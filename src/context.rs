//! Caller context for a mail render

use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};

use crate::templates::PackageLocator;

/// Optional caller data that extends the template search path and is visible to templates
#[derive(Debug, Clone, Default)]
pub struct MailContext {
    package: Option<String>,
    package_root: Option<PathBuf>,
    data: Map<String, JsonValue>,
}

impl MailContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for the package `key` rooted at `root`
    pub fn for_package<K: Into<String>, P: Into<PathBuf>>(key: K, root: P) -> Self {
        Self {
            package: Some(key.into()),
            package_root: Some(root.into()),
            data: Map::new(),
        }
    }

    /// Create a context for a package registered with `locator`
    pub fn from_locator(key: &str, locator: &dyn PackageLocator) -> Option<Self> {
        locator
            .package_root(key)
            .map(|root| Self::for_package(key, root))
    }

    /// Add a value exposed to templates as `context.<key>`
    pub fn with_data<K: Into<String>, V: Into<JsonValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<JsonValue>>(&mut self, key: K, value: V) {
        self.data.insert(key.into(), value.into());
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Directory whose `Resources/Private/Templates/Mail` is searched last
    pub fn package_root(&self) -> Option<&Path> {
        self.package_root.as_deref()
    }

    /// Object handed to the template engine under the `context` name
    pub fn template_data(&self) -> JsonValue {
        let mut object = self.data.clone();
        if let Some(package) = &self.package {
            object.insert("package".to_string(), JsonValue::from(package.as_str()));
        }
        JsonValue::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::PackageMap;
    use serde_json::json;

    #[test]
    fn test_for_package() {
        let ctx = MailContext::for_package("shop", "/srv/shop");
        assert_eq!(ctx.package(), Some("shop"));
        assert_eq!(ctx.package_root(), Some(Path::new("/srv/shop")));
    }

    #[test]
    fn test_from_locator() {
        let locator = PackageMap::new().with_package("shop", "/srv/shop");
        let ctx = MailContext::from_locator("shop", &locator).unwrap();
        assert_eq!(ctx.package_root(), Some(Path::new("/srv/shop")));
        assert!(MailContext::from_locator("blog", &locator).is_none());
    }

    #[test]
    fn test_template_data_includes_package() {
        let ctx = MailContext::for_package("shop", "/srv/shop").with_data("locale", "de");
        assert_eq!(
            ctx.template_data(),
            json!({ "locale": "de", "package": "shop" })
        );
    }

    #[test]
    fn test_empty_context_template_data() {
        assert_eq!(MailContext::new().template_data(), json!({}));
    }
}
