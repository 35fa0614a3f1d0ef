use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::descriptor::{DescriptorKind, KindMap};
use crate::error::ConvertError;

/// Persists rendered classes into the per-kind output directories
///
/// Each write goes to a temporary file in the target directory which is then
/// renamed over `<short_name>.<extension>`, so a target is either fully
/// replaced or left as it was.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dirs: KindMap<PathBuf>,
    extension: String,
}

impl OutputWriter {
    /// Create a writer for the given output directories and file extension
    pub fn new(dirs: KindMap<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        OutputWriter {
            dirs,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Output directory for `kind`
    pub fn output_dir(&self, kind: DescriptorKind) -> &Path {
        self.dirs.get(kind)
    }

    /// File a class of `kind` named `short_name` is written to
    pub fn output_path(&self, kind: DescriptorKind, short_name: &str) -> PathBuf {
        if self.extension.is_empty() {
            self.output_dir(kind).join(short_name)
        } else {
            self.output_dir(kind)
                .join(format!("{short_name}.{}", self.extension))
        }
    }

    /// Write `text` as the output file for `short_name`, replacing any previous content
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Write`] if the directory cannot be created or the
    /// file cannot be written. The target is left untouched in that case.
    pub fn write(
        &self,
        kind: DescriptorKind,
        short_name: &str,
        text: &str,
    ) -> Result<PathBuf, ConvertError> {
        let dir = self.output_dir(kind);
        let target = self.output_path(kind, short_name);

        // create_dir_all is a no-op when another worker got there first
        fs::create_dir_all(dir).map_err(|source| ConvertError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let write_err = |source| ConvertError::Write {
            path: target.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(write_err)?;
        }
        tmp.persist(&target).map_err(|e| write_err(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn writer(root: &Path) -> OutputWriter {
        OutputWriter::new(
            KindMap {
                object: root.join("Output"),
                fields: root.join("Output/Fields"),
                values: root.join("Output/Values"),
            },
            "cs",
        )
    }

    #[test]
    fn test_output_path_per_kind() {
        let writer = writer(Path::new("/out"));
        assert_eq!(
            writer.output_path(DescriptorKind::Object, "Campaign"),
            PathBuf::from("/out/Output/Campaign.cs")
        );
        assert_eq!(
            writer.output_path(DescriptorKind::FieldEnumeration, "AdFields"),
            PathBuf::from("/out/Output/Fields/AdFields.cs")
        );
        assert_eq!(
            writer.output_path(DescriptorKind::ValueEnumeration, "AdStatus"),
            PathBuf::from("/out/Output/Values/AdStatus.cs")
        );
    }

    #[test]
    fn test_write_creates_directory_and_replaces_content() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = writer(tmp.path());

        let path = writer
            .write(DescriptorKind::ValueEnumeration, "AdStatus", "first version, longer")
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first version, longer");

        writer
            .write(DescriptorKind::ValueEnumeration, "AdStatus", "second")
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        // no temporary files are left behind
        let entries: Vec<_> = fs::read_dir(tmp.path().join("Output/Values"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("AdStatus.cs")]);
    }

    #[test]
    fn test_write_failure_is_write_error() {
        let tmp = tempfile::tempdir().unwrap();
        // a file where the output directory should be
        fs::write(tmp.path().join("Output"), "blocker").unwrap();
        let err = writer(tmp.path())
            .write(DescriptorKind::Object, "Campaign", "text")
            .unwrap_err();
        assert_eq!(err.kind_name(), "WriteError");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_extension_without_dot() {
        let writer = OutputWriter::new(KindMap::from_fn(|_| PathBuf::from("out")), ".txt");
        assert_eq!(
            writer.output_path(DescriptorKind::Object, "Ad"),
            PathBuf::from("out/Ad.txt")
        );
    }
}
