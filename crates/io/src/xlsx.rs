// Excel import (xlsx, xls, xlsb, ods) and report export (xlsx only)
//
// Import: every sheet becomes a text grid; cell types are flattened to the
//         text a user would see.
// Export: logical report tables, one worksheet each.

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use shipcheck_recon::report::{ReportCell, ReportTable, MAX_SHEET_NAME};
use shipcheck_recon::Grid;

/// Import every sheet of an Excel file, in workbook order.
pub fn import(path: &Path) -> Result<Vec<(String, Grid)>, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

        let mut grid = Grid::new();

        // Range start offset (data may not begin at A1)
        let (data_start_row, data_start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            let target_row = data_start_row as usize + row_idx;
            for (col_idx, cell) in row.iter().enumerate() {
                if let Some(text) = cell_text(cell) {
                    grid.set(target_row, data_start_col as usize + col_idx, text);
                }
            }
        }

        log::debug!("sheet '{}': {} cell(s)", sheet_name, grid.len());
        sheets.push((sheet_name.clone(), grid));
    }

    Ok(sheets)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(format!("{}", n)),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{:?}", e)),
        // Serial number; identifiers are never dates
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Export statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
}

/// Write report tables to an xlsx file, one worksheet per table.
///
/// Header rows are bold. Worksheet names are made valid and unique.
pub fn export(tables: &[ReportTable], path: &Path) -> Result<ExportResult, String> {
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();
    let bold = Format::new().set_bold();
    let mut used_names = HashSet::new();

    for table in tables {
        let name = unique_sheet_name(&table.name, &mut used_names);
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", name, e))?;

        let mut row = 0u32;
        if let Some(ref header) = table.header {
            for (col, title) in header.iter().enumerate() {
                worksheet
                    .write_string_with_format(row, col as u16, title, &bold)
                    .map_err(|e| format!("Failed to write header: {}", e))?;
                result.cells_exported += 1;
            }
            row += 1;
        }

        for cells in &table.rows {
            for (col, cell) in cells.iter().enumerate() {
                match cell {
                    ReportCell::Text(s) => {
                        worksheet
                            .write_string(row, col as u16, s)
                            .map_err(|e| format!("Failed to write cell: {}", e))?;
                    }
                    ReportCell::Count(n) => {
                        worksheet
                            .write_number(row, col as u16, *n as f64)
                            .map_err(|e| format!("Failed to write cell: {}", e))?;
                    }
                    ReportCell::Empty => continue,
                }
                result.cells_exported += 1;
            }
            row += 1;
        }

        worksheet.autofit();
        result.sheets_exported += 1;
    }

    if result.sheets_exported == 0 {
        // An xlsx file needs at least one worksheet
        xlsx_workbook.add_worksheet();
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    Ok(result)
}

/// Replace characters Excel forbids in sheet names, cap the length and
/// de-duplicate case-insensitively.
fn unique_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base: String = if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}
