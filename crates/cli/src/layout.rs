//! Registry layout flags shared by `parse` and `run`.

use std::path::PathBuf;

use clap::Args;
use shipcheck_recon::config::{
    ColumnList, LocationConfig, LocationKind, OutputConfig, ReconConfig, SourceConfig,
};
use shipcheck_recon::validate::ModuleFormat;

use crate::exit_codes::{EXIT_RECON_INVALID_CONFIG, EXIT_RECON_IO};
use crate::CliError;

pub const DEFAULT_APARTMENT: &str = "B";
pub const DEFAULT_LOCATION: &str = "C";
pub const DEFAULT_MODULES: &str = "D,E,F";

#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// TOML config describing the registry layout (replaces the flags below)
    #[arg(long, short = 'c', env = "SHIPCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Apartment column label [default: B]
    #[arg(long, value_name = "COL", conflicts_with = "config")]
    pub apartment: Option<String>,

    /// Location column label, one location per row [default: C]
    #[arg(long, value_name = "COL", conflicts_with_all = ["config", "location_in_header", "no_location"])]
    pub location: Option<String>,

    /// Take each module column's location from its header cell
    #[arg(long, conflicts_with_all = ["config", "no_location"])]
    pub location_in_header: bool,

    /// Do not track locations
    #[arg(long, conflicts_with = "config")]
    pub no_location: bool,

    /// Module column labels, comma separated [default: D,E,F]
    #[arg(long, value_name = "COLS", conflicts_with = "config")]
    pub modules: Option<String>,

    /// Identifier format: prefixed_13, digit_zri_10, or any other name for pass-through
    #[arg(long, conflicts_with = "config")]
    pub format: Option<ModuleFormat>,

    /// The first occupied row is data, not a header
    #[arg(long, conflicts_with = "config")]
    pub no_header: bool,

    /// Registry sheet name [default: first sheet]
    #[arg(long, conflicts_with = "config")]
    pub sheet: Option<String>,
}

impl LayoutArgs {
    /// Build a validated config from the TOML file or the flags.
    pub fn resolve(&self) -> Result<ReconConfig, CliError> {
        if let Some(ref path) = self.config {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::new(EXIT_RECON_IO, format!("cannot read config {}: {e}", path.display()))
            })?;
            return ReconConfig::from_toml(&text)
                .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()));
        }

        let mode = if self.no_location {
            LocationKind::None
        } else if self.location_in_header {
            LocationKind::Header
        } else {
            LocationKind::Column
        };
        let column = match mode {
            LocationKind::Column => Some(
                self.location
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            ),
            LocationKind::Header | LocationKind::None => None,
        };

        let config = ReconConfig {
            name: "shipcheck".to_string(),
            format: self.format.clone().unwrap_or_default(),
            source: SourceConfig {
                has_header_row: !self.no_header,
                apartment_column: self
                    .apartment
                    .clone()
                    .unwrap_or_else(|| DEFAULT_APARTMENT.to_string()),
                location: LocationConfig { mode, column },
                module_columns: ColumnList::Joined(
                    self.modules
                        .clone()
                        .unwrap_or_else(|| DEFAULT_MODULES.to_string()),
                ),
                sheet: self.sheet.clone(),
            },
            output: OutputConfig::default(),
        };

        config
            .validate()
            .map_err(|e| CliError::new(EXIT_RECON_INVALID_CONFIG, e.to_string()).with_hint(
                "column labels are letters such as B or AA; --modules takes a comma separated list",
            ))?;
        Ok(config)
    }
}
