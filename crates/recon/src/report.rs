//! Logical report tables. Rendering (xlsx, csv, styling) belongs to the sink.

use serde::Serialize;

use crate::config::SourceLayout;
use crate::grid::{ShipmentSheet, TabularSource};
use crate::model::{MatchIndex, MatchOutcome, ParseOutcome, ReconResult, ReconSummary, Record};
use crate::validate::last_seven_digits;

/// Excel's limit on worksheet name length, in characters.
pub const MAX_SHEET_NAME: usize = 31;

pub const NOT_FOUND: &str = "not found";
pub const FOUND: &str = "found";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportCell {
    Text(String),
    Count(usize),
    Empty,
}

impl From<&str> for ReportCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ReportCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<usize> for ReportCell {
    fn from(value: usize) -> Self {
        Self::Count(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<ReportCell>>,
}

impl ReportTable {
    fn new(name: &str, header: Option<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            header,
            rows: Vec::new(),
        }
    }
}

/// Generated file name: `"{prefix} dd.mm.yyyy hh-mm.{ext}"`.
pub fn stamped_file_name<Tz>(prefix: &str, ext: &str, at: &chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{prefix} {}.{ext}", at.format("%d.%m.%Y %H-%M"))
}

pub fn row_label(source_row: usize) -> String {
    format!("Row {source_row}")
}

/// Header built from optional location column and extra trailing columns.
fn header(layout: &SourceLayout, middle: &[&str], tail: &[&str]) -> Vec<String> {
    let mut cols = vec!["Apartment".to_string()];
    if layout.tracks_location() {
        cols.push("Location".into());
    }
    cols.extend(middle.iter().map(|s| s.to_string()));
    cols.extend(tail.iter().map(|s| s.to_string()));
    cols
}

fn lead(layout: &SourceLayout, record: &Record) -> Vec<ReportCell> {
    let mut row = vec![ReportCell::from(record.apartment.as_str())];
    if layout.tracks_location() {
        row.push(record.location.as_str().into());
    }
    row
}

fn record_table(name: &str, records: &[Record], layout: &SourceLayout, with_reason: bool) -> ReportTable {
    let tail: &[&str] = if with_reason {
        &["Error", "Source row"]
    } else {
        &["Source row"]
    };
    let mut table = ReportTable::new(name, Some(header(layout, &["Module"], tail)));
    for record in records {
        let mut row = lead(layout, record);
        row.push(record.display_identifier().into());
        if with_reason {
            row.push(record.invalid_reason.clone().unwrap_or_default().into());
        }
        row.push(row_label(record.source_row).into());
        table.rows.push(row);
    }
    table
}

pub fn duplicates_table(parse: &ParseOutcome, layout: &SourceLayout) -> ReportTable {
    record_table("Duplicates", &parse.duplicates, layout, false)
}

pub fn invalid_table(parse: &ParseOutcome, layout: &SourceLayout) -> ReportTable {
    record_table("Invalid records", &parse.invalid, layout, true)
}

/// Report written right after parsing; empty sections are left out.
pub fn parse_report(parse: &ParseOutcome, layout: &SourceLayout) -> Vec<ReportTable> {
    [
        record_table("Valid records", &parse.valid, layout, false),
        duplicates_table(parse, layout),
        invalid_table(parse, layout),
    ]
    .into_iter()
    .filter(|t| !t.rows.is_empty())
    .collect()
}

/// Every valid record with its first shipment location.
pub fn results_table(matches: &MatchOutcome, layout: &SourceLayout) -> ReportTable {
    let mut table = ReportTable::new(
        "Results",
        Some(header(layout, &["Module", "Shipment file and sheet"], &["Source row"])),
    );
    for row in &matches.rows {
        let mut cells = lead(layout, &row.record);
        cells.push(row.record.display_identifier().into());
        cells.push(
            row.location
                .as_ref()
                .map(|l| l.label())
                .unwrap_or_else(|| NOT_FOUND.to_string())
                .into(),
        );
        cells.push(row_label(row.record.source_row).into());
        table.rows.push(cells);
    }
    table
}

pub fn not_found_table(matches: &MatchOutcome, layout: &SourceLayout) -> ReportTable {
    let unmatched: Vec<Record> = matches.unmatched().cloned().collect();
    record_table("Not found", &unmatched, layout, false)
}

pub fn statistics_table(summary: &ReconSummary) -> ReportTable {
    let mut table = ReportTable::new("Statistics", None);
    let mut push = |label: &str, value: ReportCell| table.rows.push(vec![label.into(), value]);

    push("Processing statistics", ReportCell::Empty);
    push("Total modules in source (excluding header)", summary.total_modules.into());
    push("Removed: duplicates", summary.duplicates.into());
    push("Removed: invalid records", summary.invalid.into());
    push("Valid modules to search", summary.valid.into());
    push("Matched", summary.matched.into());
    push("Not found", summary.unmatched.into());
    push("Match percentage", format!("{:.2}%", summary.match_percentage).into());
    table.rows.push(Vec::new());
    table.rows.push(vec!["Per shipment sheet".into()]);
    for sheet in &summary.sheets {
        table.rows.push(vec![
            crate::model::sheet_label(&sheet.document, &sheet.sheet).into(),
            sheet.display().into(),
        ]);
    }
    table
}

/// Matched records only, no header, sorted by module descending.
pub fn output_table(matches: &MatchOutcome, layout: &SourceLayout) -> ReportTable {
    let mut found: Vec<_> = matches.matched().collect();
    found.sort_by(|a, b| b.record.raw_identifier.cmp(&a.record.raw_identifier));

    let mut table = ReportTable::new("Result", None);
    for row in found {
        let mut cells = lead(layout, &row.record);
        cells.push(row.record.display_identifier().into());
        if let Some(ref location) = row.location {
            cells.push(location.label().into());
        }
        table.rows.push(cells);
    }
    table
}

/// Canonical identifiers of matched records, in registry order.
pub fn export_identifiers(matches: &MatchOutcome) -> Vec<String> {
    matches
        .matched()
        .map(|row| row.record.display_identifier().to_string())
        .collect()
}

/// Worksheet name for the n-th annotated shipment copy, at most 31 chars.
pub fn shipment_copy_name(n: usize, sheet: &str) -> String {
    let full = format!("Shipment {n} ({sheet})");
    if full.chars().count() <= MAX_SHEET_NAME {
        return full;
    }
    let prefix = format!("Shp.{n} (");
    let available = MAX_SHEET_NAME.saturating_sub(prefix.chars().count() + 1);
    if available > 0 {
        let short: String = sheet.chars().take(available).collect();
        format!("{prefix}{short})")
    } else {
        format!("Shp.{n}").chars().take(MAX_SHEET_NAME).collect()
    }
}

/// Copy of a shipment sheet with one extra column marking each row
/// `found` when any of its cells carries a key present in the index.
pub fn annotate_sheet(
    sheet: &ShipmentSheet,
    index: &MatchIndex,
    has_header_row: bool,
    name: String,
) -> ReportTable {
    let mut table = ReportTable::new(&name, None);
    let Some(range) = sheet.grid.occupied_range() else {
        return table;
    };
    let status_col = range.max_col + 1;

    for row in 0..=range.max_row {
        let mut cells = vec![ReportCell::Empty; status_col + 1];
        for (col, text) in sheet.grid.row_cells(row) {
            cells[col] = text.into();
        }
        if row >= range.min_row {
            let found = sheet.grid.row_cells(row).any(|(_, text)| {
                let text = text.trim();
                !text.is_empty() && index.contains_key(&last_seven_digits(text))
            });
            cells[status_col] = if found { FOUND } else { NOT_FOUND }.into();
        }
        table.rows.push(cells);
    }

    if has_header_row && range.min_row == 0 {
        if let Some(first) = table.rows.first_mut() {
            first[status_col] = "Search result".into();
        }
    }
    table
}

/// Annotated copies of every sheet holding at least one first match.
///
/// `matches.sheets` holds one tally per offered sheet, in offer order, so
/// tallies pair with `corpus` by position.
pub fn annotated_sheets(
    corpus: &[ShipmentSheet],
    matches: &MatchOutcome,
    has_header_row: bool,
) -> Vec<ReportTable> {
    corpus
        .iter()
        .zip(&matches.sheets)
        .filter(|(_, tally)| tally.first_matches > 0)
        .enumerate()
        .map(|(i, (s, _))| annotate_sheet(s, &matches.index, has_header_row, shipment_copy_name(i + 1, &s.sheet)))
        .collect()
}

/// Full report after matching: results, statistics, problems, sheet copies.
pub fn match_report(result: &ReconResult, corpus: &[ShipmentSheet], layout: &SourceLayout) -> Vec<ReportTable> {
    let mut tables = Vec::new();
    if !result.matches.rows.is_empty() {
        tables.push(results_table(&result.matches, layout));
    }
    tables.push(statistics_table(&result.summary));
    for table in [
        not_found_table(&result.matches, layout),
        duplicates_table(&result.parse, layout),
        invalid_table(&result.parse, layout),
    ] {
        if !table.rows.is_empty() {
            tables.push(table);
        }
    }
    tables.extend(annotated_sheets(corpus, &result.matches, layout.has_header_row));
    tables
}
