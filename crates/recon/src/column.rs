use std::ops::RangeInclusive;

use crate::error::ReconError;
use crate::grid::TabularSource;

/// Convert a column label to a zero-based index (A = 0, Z = 25, AA = 26).
///
/// Only uppercase ASCII letters are accepted; callers normalize user input first.
pub fn column_label_to_index(label: &str) -> Result<usize, ReconError> {
    if label.is_empty() {
        return Err(ReconError::InvalidColumnLabel(label.to_string()));
    }
    let mut index = 0usize;
    for b in label.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(ReconError::InvalidColumnLabel(label.to_string()));
        }
        index = index
            .checked_mul(26)
            .and_then(|n| n.checked_add((b - b'A') as usize + 1))
            .ok_or_else(|| ReconError::InvalidColumnLabel(label.to_string()))?;
    }
    Ok(index - 1)
}

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn column_index_to_label(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Normalize a user-typed label (" d " -> "D") and convert it.
pub fn parse_column_label(input: &str) -> Result<usize, ReconError> {
    column_label_to_index(&input.trim().to_ascii_uppercase())
}

/// Parse a comma-separated label list ("D,E,F"). Blank entries are ignored,
/// repeated labels keep their first position.
pub fn parse_column_list(input: &str) -> Result<Vec<usize>, ReconError> {
    let mut columns = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index = parse_column_label(part)?;
        if !columns.contains(&index) {
            columns.push(index);
        }
    }
    Ok(columns)
}

/// Highest row in `rows` where any of `columns` holds non-whitespace text.
///
/// Falls back to the start of the range when no row qualifies, so trailing
/// blank rows never extend the scan.
pub fn find_last_occupied_row<S: TabularSource + ?Sized>(
    source: &S,
    rows: RangeInclusive<usize>,
    columns: &[usize],
) -> usize {
    let start = *rows.start();
    rows.rev()
        .find(|&row| {
            columns
                .iter()
                .any(|&col| source.cell(row, col).is_some_and(|v| !v.trim().is_empty()))
        })
        .unwrap_or(start)
}
