//! Converter configuration
//!
//! Every setting has a default that reproduces the conversion of the Facebook
//! Ads PHP SDK as installed by Composer (`vendor/facebook/php-business-sdk`),
//! so a config file is only needed to deviate from that layout. Files are read
//! as TOML, or as YAML when the extension is `.yaml`/`.yml`.
//!
//! Per-kind settings are tables keyed `object`, `fields` and `values`; a table
//! that is present must name all three.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::descriptor::{DescriptorKind, KindMap};

/// File name looked up in the working directory when no config is given
pub const DEFAULT_CONFIG_FILE: &str = "sdkport.toml";

/// Files that are SDK infrastructure rather than API classes
pub const DEFAULT_DENYLIST: &[&str] = &[
    "AbstractArchivableCrudObjectFields.php",
    "AbstractArchivableCrudObject.php",
    "AbstractAsyncJobObject.php",
    "AbstractCrudObject.php",
    "AbstractObject.php",
    "CanRedownloadInterface.php",
];

const MIT_LICENSE: &[&str] = &[
    "Permission is hereby granted, free of charge, to any person obtaining a copy",
    "of this software and associated documentation files (the \"Software\"), to deal",
    "in the Software without restriction, including without limitation the rights",
    "to use, copy, modify, merge, publish, distribute, sublicense, and/or sell",
    "copies of the Software, and to permit persons to whom the Software is",
    "furnished to do so, subject to the following conditions:",
    "",
    "The above copyright notice and this permission notice shall be included in all",
    "copies or substantial portions of the Software.",
    "",
    "THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR",
    "IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,",
    "FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE",
    "AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER",
    "LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,",
    "OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE",
    "SOFTWARE.",
];

/// Banner prepended to every generated file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeaderConfig {
    /// Namespaces imported with `using`
    pub usings: Vec<String>,
    /// Copyright lines
    pub copyright: Vec<String>,
    /// License text lines
    pub license: Vec<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            usings: vec![
                "System.Collections.Generic".to_string(),
                "Facebook".to_string(),
                "FacebookAds.Interfaces".to_string(),
            ],
            copyright: vec![
                "The MIT License (MIT)".to_string(),
                String::new(),
                "Copyright (c) Luke Paris (Paradoxis) | Searchresult Performancemarketing"
                    .to_string(),
            ],
            license: MIT_LICENSE.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Complete converter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConverterConfig {
    /// Base directory the input roots are relative to
    pub sdk_root: PathBuf,
    /// Base directory the output directories are relative to
    pub output_root: PathBuf,
    /// Input root per kind, relative to `sdk_root`
    pub inputs: KindMap<PathBuf>,
    /// Output directory per kind, relative to `output_root`
    pub outputs: KindMap<PathBuf>,
    /// Target (C#) namespace per kind
    pub namespaces: KindMap<String>,
    /// PHP namespace the source classes of each kind are declared in
    pub source_namespaces: KindMap<String>,
    /// File names that never produce a class
    pub denylist: Vec<String>,
    /// Extension of generated files
    pub extension: String,
    /// Worker threads; 1 converts sequentially
    pub jobs: usize,
    /// Base type of generated object classes
    pub object_base: String,
    /// Base type of generated enumeration classes
    pub enumeration_base: String,
    /// Header banner
    pub header: HeaderConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            sdk_root: PathBuf::from("vendor/facebook/php-business-sdk/src"),
            output_root: PathBuf::from("."),
            inputs: KindMap {
                object: PathBuf::from("FacebookAds/Object"),
                fields: PathBuf::from("FacebookAds/Object/Fields"),
                values: PathBuf::from("FacebookAds/Object/Values"),
            },
            outputs: KindMap {
                object: PathBuf::from("Output"),
                fields: PathBuf::from("Output/Fields"),
                values: PathBuf::from("Output/Values"),
            },
            namespaces: KindMap {
                object: "FacebookAds.Object".to_string(),
                fields: "FacebookAds.Object.Fields".to_string(),
                values: "FacebookAds.Object.Values".to_string(),
            },
            source_namespaces: KindMap {
                object: "\\FacebookAds\\Object\\".to_string(),
                fields: "\\FacebookAds\\Object\\Fields\\".to_string(),
                values: "\\FacebookAds\\Object\\Values\\".to_string(),
            },
            denylist: DEFAULT_DENYLIST.iter().map(|d| d.to_string()).collect(),
            extension: "cs".to_string(),
            jobs: 1,
            object_base: "AbstractCrudObject".to_string(),
            enumeration_base: "AbstractCrudObjectFields".to_string(),
            header: HeaderConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Input root for `kind`
    pub fn input_dir(&self, kind: DescriptorKind) -> PathBuf {
        self.sdk_root.join(self.inputs.get(kind))
    }

    /// Output directory for `kind`
    pub fn output_dir(&self, kind: DescriptorKind) -> PathBuf {
        self.output_root.join(self.outputs.get(kind))
    }

    /// Make relative `sdk_root` and `output_root` relative to `base` instead of the
    /// working directory
    pub fn resolve_relative_to(&mut self, base: &Path) {
        if self.sdk_root.is_relative() {
            self.sdk_root = base.join(&self.sdk_root);
        }
        if self.output_root.is_relative() {
            self.output_root = base.join(&self.output_root);
        }
    }

    /// Check the settings that cannot be checked by deserialization alone
    ///
    /// # Errors
    ///
    /// Returns an error if `jobs` is zero, the extension contains a path
    /// separator, or a target namespace is not a dotted identifier.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jobs == 0 {
            bail!("jobs must be at least 1");
        }
        if self.extension.contains(['/', '\\']) {
            bail!("extension '{}' must not contain a path separator", self.extension);
        }
        for kind in DescriptorKind::ALL {
            let namespace = self.namespaces.get(kind);
            if namespace
                .split('.')
                .any(|part| !crate::descriptor::is_valid_identifier(part))
            {
                bail!("{kind} namespace '{namespace}' is not a valid C# namespace");
            }
        }
        Ok(())
    }
}

/// Load a converter configuration file
///
/// Relative `sdk_root`/`output_root` values are resolved against the directory
/// containing the file.
///
/// # Arguments
///
/// * `config_path` - Path to a `.toml`, `.yaml` or `.yml` file
///
/// # Returns
///
/// Returns `Ok(Some(config))` if the file exists and parses successfully,
/// `Ok(None)` if it does not exist, and `Err` if it exists but cannot be read,
/// parsed or validated.
pub fn load_converter_config(config_path: &Path) -> anyhow::Result<Option<ConverterConfig>> {
    if !config_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read converter config: {}", config_path.display()))?;

    let is_yaml = matches!(
        config_path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let mut config: ConverterConfig = if is_yaml {
        serde_yaml::from_str(&contents).with_context(|| {
            format!("Failed to parse converter config: {}", config_path.display())
        })?
    } else {
        toml::from_str(&contents).with_context(|| {
            format!("Failed to parse converter config: {}", config_path.display())
        })?
    };

    if let Some(base) = config_path.parent() {
        config.resolve_relative_to(base);
    }
    config
        .validate()
        .with_context(|| format!("Invalid converter config: {}", config_path.display()))?;
    Ok(Some(config))
}

/// Auto-detect `sdkport.toml` in `dir`
pub fn auto_detect_config_path(dir: &Path) -> Option<PathBuf> {
    let config_path = dir.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Resolve the config file to load
///
/// Priority:
/// 1. Explicitly provided path (via CLI), whether or not it exists
/// 2. `sdkport.toml` auto-detected in `cwd`
/// 3. None (built-in defaults)
pub fn resolve_config_path(explicit_path: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    auto_detect_config_path(cwd)
}

/// Render the default configuration as TOML
pub fn default_config_toml() -> anyhow::Result<String> {
    toml::to_string_pretty(&ConverterConfig::default())
        .context("Failed to serialize the default converter config")
}

/// Write the default configuration to `config_path` only if the file does not exist
///
/// Returns `true` if the file was written, `false` if it already existed.
pub fn write_default_config_if_missing(config_path: &Path) -> anyhow::Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory for {}", config_path.display()))?;
    }
    std::fs::write(config_path, default_config_toml()?)
        .with_context(|| format!("Failed to write converter config: {}", config_path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_converter_config(&dir.path().join("missing.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_toml_resolves_relative_paths() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
sdk_root = "sdk/src"
output_root = "/abs/out"
jobs = 4
denylist = ["Skip.php"]

[namespaces]
object = "My.Object"
fields = "My.Fields"
values = "My.Values"
"#
        )
        .unwrap();

        let config = load_converter_config(file.path()).unwrap().unwrap();
        let base = file.path().parent().unwrap();
        assert_eq!(config.sdk_root, base.join("sdk/src"));
        assert_eq!(config.output_root, PathBuf::from("/abs/out"));
        assert_eq!(config.jobs, 4);
        assert_eq!(config.denylist, vec!["Skip.php".to_string()]);
        assert_eq!(config.namespaces.fields, "My.Fields");
        // untouched settings keep their defaults
        assert_eq!(config.extension, "cs");
        assert_eq!(
            config.input_dir(DescriptorKind::ValueEnumeration),
            base.join("sdk/src/FacebookAds/Object/Values")
        );
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "extension: txt\nobject_base: Base\nheader:\n  usings: [System]\n"
        )
        .unwrap();
        let config = load_converter_config(file.path()).unwrap().unwrap();
        assert_eq!(config.extension, "txt");
        assert_eq!(config.object_base, "Base");
        assert_eq!(config.header.usings, vec!["System".to_string()]);
        assert!(config.header.license.len() > 5);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "jobs = 0").unwrap();
        let err = load_converter_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("jobs must be at least 1"));

        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "jobs = \"many\"").unwrap();
        assert!(load_converter_config(file.path()).is_err());
    }

    #[test]
    fn test_resolve_config_path_priority() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_config_path(None, dir.path()), None);

        let detected = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&detected, "").unwrap();
        assert_eq!(resolve_config_path(None, dir.path()), Some(detected));

        let explicit = PathBuf::from("/elsewhere/custom.yaml");
        assert_eq!(
            resolve_config_path(Some(&explicit), dir.path()),
            Some(explicit.clone())
        );
    }

    #[test]
    fn test_default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join(DEFAULT_CONFIG_FILE);
        assert!(write_default_config_if_missing(&path).unwrap());
        assert!(!write_default_config_if_missing(&path).unwrap());

        let loaded = load_converter_config(&path).unwrap().unwrap();
        let mut expected = ConverterConfig::default();
        expected.resolve_relative_to(path.parent().unwrap());
        assert_eq!(loaded, expected);
        assert_eq!(loaded.denylist.len(), 6);
    }
}
