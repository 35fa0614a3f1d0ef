//! # Scanner Module
//!
//! Enumerates the candidate source files of one input root and turns each into
//! an unreflected [`ClassDescriptor`].
//!
//! ## Ordering
//!
//! Candidates are returned in the order [`std::fs::read_dir`] yields them. That
//! order is whatever the operating system and filesystem produce; it is **not**
//! sorted and may differ between machines. Every descriptor is tagged with its
//! position in the overall discovery sequence by the converter, which is what
//! reports are ordered by.
//!
//! ## Filtering
//!
//! Directories, denylisted file names and files whose derived class name is not
//! a usable identifier are skipped. Only the first two are silent; the last is
//! logged and counted in [`ScanResult::skipped`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::descriptor::{derive_short_name, is_valid_identifier, ClassDescriptor, DescriptorKind};
use crate::error::ConvertError;

/// Descriptors found in one input root
#[derive(Debug, Default)]
pub struct ScanResult {
    /// One descriptor per surviving file, in directory-listing order
    pub descriptors: Vec<ClassDescriptor>,
    /// Files that were neither denylisted nor usable
    pub skipped: Vec<PathBuf>,
}

/// Where and how to scan one kind's input root
#[derive(Debug, Clone, Copy)]
pub struct ScanTarget<'a> {
    /// Kind every descriptor from this root gets
    pub kind: DescriptorKind,
    /// Input root directory
    pub root: &'a Path,
    /// Target namespace generated classes are placed under
    pub namespace: &'a str,
    /// PHP namespace the source classes are declared in
    pub source_namespace: &'a str,
}

/// Scan `target.root`, skipping files named in `denylist`
///
/// # Errors
///
/// Returns [`ConvertError::DirectoryNotFound`] if the root does not exist, is
/// not a directory or cannot be listed.
pub fn scan_root(target: ScanTarget<'_>, denylist: &[String]) -> Result<ScanResult, ConvertError> {
    let missing = || ConvertError::DirectoryNotFound {
        kind: target.kind,
        path: target.root.to_path_buf(),
    };
    if !target.root.is_dir() {
        return Err(missing());
    }
    let entries = fs::read_dir(target.root).map_err(|_| missing())?;

    let mut result = ScanResult::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %target.root.display(), error = %e, "Cannot read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(file = %path.display(), "Skipping file with a non UTF-8 name");
            result.skipped.push(path);
            continue;
        };
        if denylist.iter().any(|d| d == file_name) {
            debug!(file = %path.display(), "Skipping denylisted file");
            continue;
        }

        let short_name = derive_short_name(file_name);
        if short_name.is_empty() || !is_valid_identifier(short_name) {
            warn!(
                file = %path.display(),
                class = %short_name,
                "Skipping file whose name is not a valid class name"
            );
            result.skipped.push(path);
            continue;
        }

        debug!(file = %path.display(), kind = %target.kind, "Found class file");
        let qualified_name = qualify(target.source_namespace, short_name);
        result.descriptors.push(ClassDescriptor::new(
            target.kind,
            short_name,
            target.namespace,
            qualified_name,
            path.clone(),
        ));
    }
    Ok(result)
}

/// `\FacebookAds\Object\` + `Campaign` → `\FacebookAds\Object\Campaign`
fn qualify(namespace: &str, short_name: &str) -> String {
    let namespace = namespace.trim_matches('\\');
    if namespace.is_empty() {
        format!("\\{short_name}")
    } else {
        format!("\\{namespace}\\{short_name}")
    }
}
