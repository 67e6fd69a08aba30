//! Template resolution and rendering for mail bodies.
//!
//! A template identifier is either the name or path of a template file or the
//! template text itself. The resolver checks a fixed, ordered list of candidate
//! paths built from the configured template roots and the caller context; when
//! no candidate exists the identifier is rendered as inline source.

pub mod errors;
pub mod locator;
pub mod resolver;
pub mod view;

pub use errors::ViewError;
pub use locator::{IdentityLocator, PACKAGE_PREFIX, PackageLocator, PackageMap};
pub use resolver::{candidate_paths, resolve, resolve_with};
pub use view::{TemplateView, TeraView};
