//! # sdkport
//!
//! **sdkport** converts the classes of the Facebook Ads PHP SDK into C# source
//! files: one generated class per discovered PHP class, classified as an API
//! object, a field enumeration or a value enumeration.
//!
//! ## Overview
//!
//! The PHP files are never executed. Each one is tokenised and walked
//! structurally to recover the facts the C# class needs (an object's endpoint
//! and connection methods, or an enumeration's constants in declaration order),
//! which are then rendered through askama templates and written atomically.
//!
//! ## Architecture
//!
//! - **[`descriptor`]** - The unit of work: one discovered class and its facts
//! - **[`scanner`]** - Lists the candidate files of an input root
//! - **[`reflect`]** - PHP lexer, structural parser and fact extraction
//! - **[`generator`]** - Rendering, output writing, batch conversion and the run report
//! - **[`config`]** - TOML/YAML configuration with defaults for the upstream SDK layout
//! - **[`error`]** - The conversion error taxonomy
//! - **[`logging`]** - tracing subscriber setup
//! - **[`cli`]** - The `sdkport` command line
//!
//! ### Conversion Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(sdkport convert)
//!     participant Conv as generator::Converter
//!     participant Scan as scanner::scan_root
//!     participant Refl as reflect::Reflector
//!     participant Rend as generator::Renderer
//!     participant Out as generator::OutputWriter
//!
//!     CLI->>Conv: run()
//!     Conv->>Scan: object, fields, values roots
//!     Scan-->>Conv: Vec<ClassDescriptor> (or DirectoryNotFound)
//!     loop each descriptor (optionally on a worker pool)
//!         Conv->>Refl: reflect(descriptor)
//!         Refl-->>Conv: ClassFacts
//!         Conv->>Rend: render(descriptor, started_at)
//!         Rend-->>Conv: C# source text
//!         Conv->>Out: write(kind, short_name, text)
//!         Out-->>Conv: output path
//!     end
//!     Conv-->>CLI: RunReport
//! ```
//!
//! A missing input root aborts the run before anything is written. Any other
//! failure is recorded against its class in the [`generator::RunReport`] and the
//! batch continues.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write sdkport.toml with the defaults, then edit the paths
//! sdkport init-config
//!
//! # Convert everything
//! sdkport convert --jobs 4
//!
//! # See what the reflector extracts
//! sdkport inspect --kind object
//! ```
//!
//! Library use:
//!
//! ```rust,ignore
//! use sdkport::config::ConverterConfig;
//! use sdkport::generator::Converter;
//!
//! let report = Converter::new(ConverterConfig::default()).run()?;
//! println!("{report}");
//! ```

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod logging;
pub mod reflect;
pub mod scanner;

pub use descriptor::{ClassDescriptor, DescriptorKind};
pub use error::ConvertError;
