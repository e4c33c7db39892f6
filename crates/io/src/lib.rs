// File I/O operations

use std::path::Path;

use shipcheck_recon::{Grid, ReconError, ShipmentSheet};

pub mod csv;
pub mod xlsx;

/// Extensions read through calamine.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Extensions read as delimited text.
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// A loaded source or shipment file: its display name and its sheets in order.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name as shown in reports.
    pub name: String,
    pub sheets: Vec<(String, Grid)>,
}

impl Document {
    /// Pick the registry sheet: the named one, or the first.
    pub fn sheet(&self, name: Option<&str>) -> Result<&Grid, ReconError> {
        match name {
            Some(wanted) => self
                .sheets
                .iter()
                .find(|(n, _)| n == wanted)
                .map(|(_, grid)| grid)
                .ok_or_else(|| ReconError::UnknownSheet(wanted.to_string())),
            None => self
                .sheets
                .first()
                .map(|(_, grid)| grid)
                .ok_or(ReconError::EmptySource),
        }
    }

    /// Shipment units in sheet order. Empty sheets are skipped.
    pub fn into_shipment_sheets(self) -> Vec<ShipmentSheet> {
        let document = self.name;
        self.sheets
            .into_iter()
            .filter(|(_, grid)| !grid.is_empty())
            .map(|(sheet, grid)| ShipmentSheet::new(document.clone(), sheet, grid))
            .collect()
    }
}

/// Load a document, choosing the reader by file extension.
///
/// Delimited text files become a single sheet named after the file stem.
pub fn load_document(path: &Path) -> Result<Document, String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let sheets = if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        xlsx::import(path)?
    } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
        let grid = if ext == "tsv" {
            crate::csv::import_with_delimiter(path, b'\t')?
        } else {
            crate::csv::import(path)?
        };
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        vec![(stem, grid)]
    } else {
        return Err(format!(
            "{}: unsupported file type (expected one of: {}, {})",
            path.display(),
            SPREADSHEET_EXTENSIONS.join(", "),
            DELIMITED_EXTENSIONS.join(", ")
        ));
    };

    log::info!("loaded '{}': {} sheet(s)", name, sheets.len());
    Ok(Document { name, sheets })
}
