//! Template identifier resolution
//!
//! Turns a template identifier into a concrete file path by checking an ordered
//! list of candidates. The list is built without touching the file system so
//! that the order can be verified on its own; the existence check is injected.

use std::path::Path;
use tracing::{debug, info};

use super::locator::PackageLocator;

/// Directory below each template root that holds mail templates
pub const MAIL_SUBDIR: &str = "Mail";

/// Location of mail templates inside a package root
pub const PACKAGE_MAIL_DIR: &str = "Resources/Private/Templates/Mail";

/// File extension tried after the bare name
pub const TEMPLATE_EXTENSION: &str = ".html";

/// Build the ordered list of candidate file paths for `identifier`.
///
/// Order (first existing file wins):
/// 1. the identifier as given
/// 2. the identifier expanded by `locator`
/// 3. per root: `root/Mail/id`, its expansion, `root/Mail/id.html`, the expansion plus `.html`
/// 4. with a context root: `ctx/Resources/Private/Templates/Mail/id.html`, then without `.html`
///
/// Expansions the locator cannot perform are skipped.
pub fn candidate_paths<S: AsRef<str>>(
    identifier: &str,
    roots: &[S],
    context_root: Option<&Path>,
    locator: &dyn PackageLocator,
) -> Vec<String> {
    let mut candidates = Vec::with_capacity(2 + roots.len() * 4 + 2);

    candidates.push(identifier.to_string());
    candidates.extend(locator.expand(identifier));

    for root in roots {
        let path = format!(
            "{}/{}/{}",
            root.as_ref().trim_end_matches('/'),
            MAIL_SUBDIR,
            identifier
        );
        let expanded = locator.expand(&path);

        candidates.push(path.clone());
        candidates.extend(expanded.clone());
        candidates.push(format!("{path}{TEMPLATE_EXTENSION}"));
        candidates.extend(expanded.map(|e| format!("{e}{TEMPLATE_EXTENSION}")));
    }

    if let Some(ctx) = context_root {
        let base = format!(
            "{}/{}/{}",
            ctx.to_string_lossy().trim_end_matches('/'),
            PACKAGE_MAIL_DIR,
            identifier
        );
        candidates.push(format!("{base}{TEMPLATE_EXTENSION}"));
        candidates.push(base);
    }

    candidates
}

/// Resolve `identifier` using an injected existence check.
///
/// Returns the first candidate for which `exists` is true, or `None` when the
/// identifier should be treated as inline template source.
pub fn resolve_with<S, F>(
    identifier: &str,
    roots: &[S],
    context_root: Option<&Path>,
    locator: &dyn PackageLocator,
    mut exists: F,
) -> Option<String>
where
    S: AsRef<str>,
    F: FnMut(&Path) -> bool,
{
    if identifier.is_empty() {
        return None;
    }

    let resolved = candidate_paths(identifier, roots, context_root, locator)
        .into_iter()
        .find(|candidate| {
            let found = !candidate.is_empty() && exists(Path::new(candidate));
            debug!("Template candidate {} exists: {}", candidate, found);
            found
        });

    match &resolved {
        Some(path) => info!("Resolved mail template to file: {}", path),
        None => debug!("No template file found, using identifier as inline source"),
    }
    resolved
}

/// Resolve `identifier` against the real file system
pub fn resolve<S: AsRef<str>>(
    identifier: &str,
    roots: &[S],
    context_root: Option<&Path>,
    locator: &dyn PackageLocator,
) -> Option<String> {
    resolve_with(identifier, roots, context_root, locator, |p| p.is_file())
}
