use std::collections::BTreeMap;

use serde::Serialize;

use crate::validate::ValidationOutcome;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Format-valid, duplicate status not decided yet.
    Pending,
    Valid,
    Duplicate,
    Invalid,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Valid => write!(f, "valid"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// One observation of a module at a location.
///
/// `canonical` and `search_key` are set exactly when `status != Invalid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub apartment: String,
    pub location: String,
    pub raw_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_key: Option<String>,
    /// 1-based row in the source sheet.
    pub source_row: usize,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
}

impl Record {
    pub fn from_outcome(
        apartment: String,
        location: String,
        raw_identifier: String,
        source_row: usize,
        outcome: ValidationOutcome,
    ) -> Self {
        let (canonical, search_key, status, invalid_reason) = match outcome {
            ValidationOutcome::Valid {
                canonical,
                search_key,
            } => (Some(canonical), Some(search_key), RecordStatus::Pending, None),
            ValidationOutcome::Invalid { reason } => (None, None, RecordStatus::Invalid, Some(reason)),
        };
        Self {
            apartment,
            location,
            raw_identifier,
            canonical,
            search_key,
            source_row,
            status,
            invalid_reason,
        }
    }

    /// Canonical form when known, raw text otherwise.
    pub fn display_identifier(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.raw_identifier)
    }
}

/// Output of the parse stage: extraction followed by deduplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutcome {
    /// Every non-empty module cell read from the source.
    pub total_modules: usize,
    pub valid: Vec<Record>,
    pub duplicates: Vec<Record>,
    pub invalid: Vec<Record>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MatchLocation {
    pub document: String,
    pub sheet: String,
}

impl MatchLocation {
    pub fn label(&self) -> String {
        sheet_label(&self.document, &self.sheet)
    }
}

/// "document — sheet", as shown in reports.
pub fn sheet_label(document: &str, sheet: &str) -> String {
    format!("{document} — {sheet}")
}

/// Search key -> first (document, sheet) where it was seen.
pub type MatchIndex = BTreeMap<String, MatchLocation>;

/// Scan bookkeeping for one shipment sheet, in the order sheets were offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetTally {
    pub document: String,
    pub sheet: String,
    pub occupied_cells: usize,
    /// Keys whose first occurrence is on this sheet.
    pub first_matches: usize,
    /// False when the scan had already found every key before this sheet.
    pub scanned: bool,
}

/// A valid record together with where its key was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<MatchLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub index: MatchIndex,
    pub required_keys: usize,
    pub sheets: Vec<SheetTally>,
    /// One row per valid record, in registry order.
    pub rows: Vec<MatchRow>,
}

impl MatchOutcome {
    pub fn matched(&self) -> impl Iterator<Item = &MatchRow> {
        self.rows.iter().filter(|r| r.location.is_some())
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &Record> {
        self.rows
            .iter()
            .filter(|r| r.location.is_none())
            .map(|r| &r.record)
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRatio {
    pub document: String,
    pub sheet: String,
    pub found: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

impl SheetRatio {
    /// "found / total", or "found / ?" for a sheet without occupied cells.
    pub fn display(&self) -> String {
        if self.total > 0 {
            format!("{} / {}", self.found, self.total)
        } else {
            format!("{} / ?", self.found)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub total_modules: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub valid: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub match_percentage: f64,
    pub sheets: Vec<SheetRatio>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub parse: ParseOutcome,
    pub matches: MatchOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub format: String,
    pub engine_version: String,
    pub run_at: String,
}
