// shipcheck CLI - module registry vs. shipment reconciliation

mod exit_codes;
mod layout;
mod logging;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use shipcheck_recon::validate::ModuleFormat;

use exit_codes::EXIT_SUCCESS;
use layout::LayoutArgs;

#[derive(Parser)]
#[command(name = "shipcheck")]
#[command(about = "Check installed-module registries against shipment documents")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a registry: extract, validate and deduplicate module identifiers
    #[command(after_help = "\
Examples:
  shipcheck parse registry.xlsx
  shipcheck parse registry.xlsx --modules D,E,F --location C
  shipcheck parse registry.csv --no-location --report parse.xlsx
  shipcheck parse registry.xlsx --config block7.toml --json")]
    Parse {
        /// Registry file (xlsx, xls, xlsb, ods, csv, tsv)
        source: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Write the parse report (valid, duplicates, invalid) to this xlsx file
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Parse a registry and search its modules in shipment documents
    #[command(after_help = "\
Examples:
  shipcheck run registry.xlsx march.xlsx april.xlsx
  shipcheck run registry.xlsx shipments/*.xlsx --out-dir out
  shipcheck run registry.xlsx march.csv --config block7.toml --json
  shipcheck run registry.xlsx march.xlsx --output result.json

Exit code 63 means some valid modules were not found.")]
    Run {
        /// Registry file (xlsx, xls, xlsb, ods, csv, tsv)
        source: PathBuf,

        /// Shipment documents, searched in the order given
        #[arg(required = true)]
        shipments: Vec<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Write report, output and export files into this directory
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a layout config without running
    #[command(after_help = "\
Examples:
  shipcheck validate block7.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },

    /// Show how identifiers validate and which search key they produce
    #[command(after_help = "\
Examples:
  shipcheck key 04B6481958134315 SN-8134315-X
  shipcheck key 6zri8911468998 --format digit_zri_10 --json")]
    Key {
        /// Identifiers to check
        #[arg(required = true)]
        values: Vec<String>,

        /// Identifier format
        #[arg(long, default_value = "prefixed_13")]
        format: ModuleFormat,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  shipcheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  shipcheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Parse { source, layout, report, json } => {
            recon::cmd_parse(source, layout, report, json)
        }
        Commands::Run { source, shipments, layout, out_dir, json, output } => {
            recon::cmd_run(source, shipments, layout, out_dir, json, output)
        }
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Key { values, format, json } => recon::cmd_key(values, format, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
