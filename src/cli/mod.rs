//! # CLI Module
//!
//! Command-line interface of the `sdkport` binary.
//!
//! ## Commands
//!
//! ### `convert`
//!
//! Convert every class found under the three SDK input roots:
//!
//! ```bash
//! sdkport convert --sdk-root vendor/facebook/php-business-sdk/src --output .
//! ```
//!
//! Options:
//! - `--config <FILE>` - Configuration file (default: `./sdkport.toml` if present)
//! - `--sdk-root <DIR>` - Override the SDK source root
//! - `--output <DIR>` - Override the output root
//! - `--jobs <N>` - Worker threads (default: 1, sequential)
//! - `--dry-run` - Render but do not write
//! - `--json` - Print the summary as JSON
//!
//! The command fails only when an input root is missing or the configuration
//! cannot be loaded; classes that fail to convert are listed in the report.
//!
//! ### `inspect`
//!
//! Reflect the SDK and print one line per class:
//!
//! ```bash
//! sdkport inspect --kind object
//! ```
//!
//! ### `init-config`
//!
//! Write a starter `sdkport.toml` with every default spelled out:
//!
//! ```bash
//! sdkport init-config --path sdkport.toml
//! ```
//!
//! `--verbose` (any command) raises the log level to debug.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands, KindArg};
