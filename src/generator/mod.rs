//! # Generator Module
//!
//! Turns reflected descriptors into C# source files and drives whole batches.
//!
//! ## Overview
//!
//! - **Templates** - [`Renderer`] selects an Askama template by descriptor kind
//!   and renders it
//! - **Writer** - [`OutputWriter`] places each file in its kind's output
//!   directory with an atomic replace
//! - **Converter** - [`Converter`] runs scan → reflect → render → write for
//!   every discovered class, sequentially or on a bounded worker pool
//! - **Report** - [`RunReport`] collects one [`FileOutcome`] per class plus
//!   totals and timing
//!
//! ## Architecture
//!
//! ```text
//! Input roots → Scanner → Reflector → Renderer → Writer → Output directories
//!                                                   ↓
//!                                               RunReport
//! ```
//!
//! Only a missing input root stops a batch. Any other failure is recorded
//! against the class it happened to and the batch carries on.
//!
//! ## Templates
//!
//! Templates are located in the `templates/` directory:
//!
//! - `header.cs.txt` - Banner, `using` directives and generation date, included by the others
//! - `object.cs.txt` - API object with endpoint accessor and connection methods
//! - `enumeration.cs.txt` - Field and value enumerations (string constants)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdkport::config::ConverterConfig;
//! use sdkport::generator::Converter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Converter::new(ConverterConfig::default()).run()?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

mod converter;
mod report;
mod templates;
#[cfg(test)]
mod tests;
mod writer;

pub use converter::*;
pub use report::*;
pub use templates::*;
pub use writer::*;
