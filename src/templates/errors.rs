//! Error types for the template view

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering a template view
#[derive(Error, Debug)]
pub enum ViewError {
    /// Neither a template file nor inline source was configured
    #[error("No template configured")]
    NoTemplate,

    /// IO error while reading a template or partial
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template engine error (syntax errors, missing variables, ...)
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),
}

impl ViewError {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
