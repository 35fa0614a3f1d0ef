use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::{
    load_converter_config, resolve_config_path, write_default_config_if_missing, ConverterConfig,
    DEFAULT_CONFIG_FILE,
};
use crate::descriptor::{ClassFacts, DescriptorKind};
use crate::generator::{Converter, Inspection};
use crate::logging::{init_logging_with_config, LogConfig};

/// Command-line interface for sdkport
///
/// Converts the classes of the Facebook Ads PHP SDK into C# source files.
#[derive(Parser)]
#[command(name = "sdkport")]
#[command(about = "PHP SDK to C# class converter", long_about = None)]
pub struct Cli {
    /// Log at debug level (per-file discovery and timing)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Convert every class of the SDK into a C# file
    Convert {
        /// Configuration file (TOML, or YAML by extension); defaults to ./sdkport.toml if present
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the SDK source root the input directories are relative to
        #[arg(long)]
        sdk_root: Option<PathBuf>,

        /// Override the root the output directories are relative to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of worker threads (1 = sequential)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Render everything but do not write any file
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the run summary as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Reflect the SDK classes and print what would be generated
    Inspect {
        /// Configuration file (TOML, or YAML by extension); defaults to ./sdkport.toml if present
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the SDK source root the input directories are relative to
        #[arg(long)]
        sdk_root: Option<PathBuf>,

        /// Only show classes of this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Write a starter configuration file (never overwrites)
    InitConfig {
        /// Where to write the file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

/// Descriptor kind as accepted on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// API objects
    Object,
    /// Field enumerations
    Fields,
    /// Value enumerations
    Values,
}

impl From<KindArg> for DescriptorKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Object => DescriptorKind::Object,
            KindArg::Fields => DescriptorKind::FieldEnumeration,
            KindArg::Values => DescriptorKind::ValueEnumeration,
        }
    }
}

/// Parse the command line, set up logging and run the selected command
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, or if the batch is
/// aborted because an input root is missing. Per-file conversion failures are
/// reported but do not make this fail.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env().verbose(cli.verbose))?;
    execute(&cli)
}

/// Run an already parsed command line
///
/// # Errors
///
/// See [`run_cli`].
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Convert {
            config,
            sdk_root,
            output,
            jobs,
            dry_run,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(sdk_root) = sdk_root {
                config.sdk_root = sdk_root.clone();
            }
            if let Some(output) = output {
                config.output_root = output.clone();
            }
            if let Some(jobs) = jobs {
                config.jobs = *jobs;
            }
            config.validate()?;

            let report = Converter::new(config)
                .dry_run(*dry_run)
                .run()
                .context("Conversion aborted")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report.summary())?);
            } else {
                println!("{report}");
            }
            Ok(())
        }
        Commands::Inspect {
            config,
            sdk_root,
            kind,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(sdk_root) = sdk_root {
                config.sdk_root = sdk_root.clone();
            }
            let wanted = kind.map(DescriptorKind::from);
            let inspected = Converter::new(config)
                .inspect()
                .context("Inspection aborted")?;
            for inspection in inspected
                .iter()
                .filter(|i| wanted.map_or(true, |k| i.descriptor.kind == k))
            {
                println!("{}", describe(inspection));
            }
            Ok(())
        }
        Commands::InitConfig { path } => {
            if write_default_config_if_missing(path)? {
                println!("Wrote default configuration to {}", path.display());
            } else {
                println!("Configuration already exists at {}", path.display());
            }
            Ok(())
        }
    }
}

/// Load the explicit or auto-detected config file, or fall back to the defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<ConverterConfig> {
    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    match resolve_config_path(explicit, &cwd) {
        Some(path) => load_converter_config(&path)?
            .with_context(|| format!("Config file not found: {}", path.display())),
        None => {
            let mut config = ConverterConfig::default();
            config.resolve_relative_to(&cwd);
            Ok(config)
        }
    }
}

/// One line describing a reflected class
pub(crate) fn describe(inspection: &Inspection) -> String {
    let descriptor = &inspection.descriptor;
    if let Some(err) = &inspection.error {
        return format!(
            "{:<7} {:<40} {}: {}",
            descriptor.kind.key(),
            descriptor.short_name,
            err.kind_name(),
            err
        );
    }
    let detail = match &descriptor.facts {
        Some(ClassFacts::Object { endpoint, methods }) => {
            let bound = methods
                .iter()
                .filter(|m| m.connection_endpoint.is_some())
                .count();
            match endpoint {
                Some(endpoint) => format!("endpoint=\"{endpoint}\" methods={bound}"),
                None => format!("endpoint=<undefined> methods={bound}"),
            }
        }
        Some(ClassFacts::Enumeration { constants }) => format!("constants={}", constants.len()),
        None => "not reflected".to_string(),
    };
    format!(
        "{:<7} {:<40} {}",
        descriptor.kind.key(),
        descriptor.short_name,
        detail
    )
}
