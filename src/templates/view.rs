//! Template view abstraction and its Tera-based implementation

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::{debug, warn};

use super::errors::ViewError;
use crate::context::MailContext;

/// Name under which inline template source is registered; the suffix makes Tera escape it
const INLINE_TEMPLATE_NAME: &str = "__inline_mail_body.html";

/// Rendering side of a templated mail message
pub trait TemplateView {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Render the template stored at `path`
    fn set_template_path_and_filename(&mut self, path: &Path);

    /// Render `source` as template text
    fn set_template_source(&mut self, source: &str);

    /// Make `value` available to the template as `key`
    fn assign(&mut self, key: &str, value: JsonValue);

    /// Make the caller context available to the template
    fn set_context(&mut self, context: &MailContext);

    fn render(&mut self) -> Result<String, Self::Error>;
}

#[derive(Debug, Clone, Default)]
enum TemplateSelection {
    #[default]
    Unset,
    File(PathBuf),
    Source(String),
}

/// Tera-based template view
#[derive(Debug, Clone)]
pub struct TeraView {
    template: TemplateSelection,
    variables: HashMap<String, JsonValue>,
    context: Option<MailContext>,
    partial_root_paths: Vec<PathBuf>,
    escape_html: bool,
}

impl Default for TeraView {
    fn default() -> Self {
        Self {
            template: TemplateSelection::default(),
            variables: HashMap::new(),
            context: None,
            partial_root_paths: Vec::new(),
            escape_html: true,
        }
    }
}

impl TeraView {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTML-escape variables in inline source and `.html` files (on by default).
    /// Turn off for plain text bodies.
    pub fn set_escape_html(&mut self, escape: bool) {
        self.escape_html = escape;
    }

    /// Directories whose files can be included or extended by name
    pub fn set_partial_root_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.partial_root_paths = paths.into_iter().map(Into::into).collect();
    }

    pub fn assign_multiple(&mut self, values: HashMap<String, JsonValue>) {
        self.variables.extend(values);
    }

    pub fn variables(&self) -> &HashMap<String, JsonValue> {
        &self.variables
    }

    /// Path of the configured template file, if the view renders from a file
    pub fn template_path(&self) -> Option<&Path> {
        match &self.template {
            TemplateSelection::File(path) => Some(path),
            _ => None,
        }
    }

    fn build_context(&self) -> Context {
        let mut ctx = Context::new();
        if let Some(mail_ctx) = &self.context {
            ctx.insert("context", &mail_ctx.template_data());
        }
        for (key, value) in &self.variables {
            ctx.insert(key.as_str(), value);
        }
        ctx
    }

    fn register_partials(&self, tera: &mut Tera) -> Result<(), ViewError> {
        for root in &self.partial_root_paths {
            if !root.is_dir() {
                warn!("Partial root path is not a directory: {}", root.display());
                continue;
            }

            let mut partials = Vec::new();
            collect_partials(root, root, &mut partials)?;
            debug!(
                "Registering {} partial(s) from {}",
                partials.len(),
                root.display()
            );
            tera.add_raw_templates(partials)?;
        }
        Ok(())
    }
}

impl TemplateView for TeraView {
    type Error = ViewError;

    fn set_template_path_and_filename(&mut self, path: &Path) {
        self.template = TemplateSelection::File(path.to_path_buf());
    }

    fn set_template_source(&mut self, source: &str) {
        self.template = TemplateSelection::Source(source.to_string());
    }

    fn assign(&mut self, key: &str, value: JsonValue) {
        self.variables.insert(key.to_string(), value);
    }

    fn set_context(&mut self, context: &MailContext) {
        self.context = Some(context.clone());
    }

    fn render(&mut self) -> Result<String, ViewError> {
        let (name, content) = match &self.template {
            TemplateSelection::Unset => return Err(ViewError::NoTemplate),
            TemplateSelection::File(path) => {
                let content =
                    fs::read_to_string(path).map_err(|e| ViewError::io(path.clone(), e))?;
                (path.to_string_lossy().into_owned(), content)
            }
            TemplateSelection::Source(source) => {
                (INLINE_TEMPLATE_NAME.to_string(), source.clone())
            }
        };

        let mut tera = Tera::default();
        if !self.escape_html {
            tera.autoescape_on(Vec::new());
        }
        self.register_partials(&mut tera)?;
        tera.add_raw_template(&name, &content)?;

        let rendered = tera.render(&name, &self.build_context())?;
        debug!("Rendered template {} ({} bytes)", name, rendered.len());
        Ok(rendered)
    }
}

/// Collect readable files below `dir` as `(name relative to root, content)`.
/// Hidden files, files that are not UTF-8 text and symlinked directories are skipped.
fn collect_partials(
    root: &Path,
    dir: &Path,
    partials: &mut Vec<(String, String)>,
) -> Result<(), ViewError> {
    let entries = fs::read_dir(dir).map_err(|e| ViewError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ViewError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| ViewError::io(&path, e))?;

        if file_type.is_dir() {
            collect_partials(root, &path, partials)?;
            continue;
        }
        if file_type.is_symlink() && path.is_dir() {
            warn!("Not following symlinked directory {}", path.display());
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                partials.push((name, content));
            }
            Err(e) => warn!("Skipping unreadable partial {}: {}", path.display(), e),
        }
    }
    Ok(())
}
