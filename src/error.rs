//! # Error Module
//!
//! Error taxonomy for a conversion run.
//!
//! Only [`ConvertError::DirectoryNotFound`] is fatal: the three input roots are
//! required infrastructure, so a missing one aborts the batch before anything is
//! written. Every other variant is scoped to a single descriptor. The converter
//! records it in the [`RunReport`](crate::generator::RunReport) and moves on to
//! the next file.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::descriptor::DescriptorKind;

/// Errors produced while scanning, reflecting, rendering or writing classes
#[derive(Debug)]
pub enum ConvertError {
    /// An input root does not exist or is not a directory
    DirectoryNotFound {
        /// Kind of descriptors the root was configured for
        kind: DescriptorKind,
        /// The missing path
        path: PathBuf,
    },
    /// The source file could not be read or does not define the expected class
    Reflection {
        /// Source file that was being reflected
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
    /// The descriptor is missing something the selected template needs
    Template {
        /// Short name of the class being rendered
        class_name: String,
        /// What went wrong
        reason: String,
    },
    /// The rendered text could not be persisted
    Write {
        /// Target output file
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },
}

impl ConvertError {
    /// Build a [`ConvertError::Reflection`]
    pub fn reflection(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ConvertError::Reflection {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`ConvertError::Template`]
    pub fn template(class_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConvertError::Template {
            class_name: class_name.into(),
            reason: reason.into(),
        }
    }

    /// Taxonomy label used in report lines
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConvertError::DirectoryNotFound { .. } => "DirectoryNotFound",
            ConvertError::Reflection { .. } => "ReflectionError",
            ConvertError::Template { .. } => "TemplateError",
            ConvertError::Write { .. } => "WriteError",
        }
    }

    /// Whether this error aborts the whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConvertError::DirectoryNotFound { .. })
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::DirectoryNotFound { kind, path } => write!(
                f,
                "{} input directory '{}' not found or is not a valid directory",
                kind,
                path.display()
            ),
            ConvertError::Reflection { path, reason } => {
                write!(f, "cannot reflect '{}': {}", path.display(), reason)
            }
            ConvertError::Template { class_name, reason } => {
                write!(f, "cannot render class '{}': {}", class_name, reason)
            }
            ConvertError::Write { path, source } => {
                write!(f, "cannot write '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}
