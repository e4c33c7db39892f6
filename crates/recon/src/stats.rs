use crate::model::{MatchOutcome, ParseOutcome, ReconSummary, SheetRatio};

/// Aggregate counts from the parse and match stages.
///
/// Sheet ratios are listed for sheets holding at least one first match, in
/// scan order.
pub fn compute_summary(parse: &ParseOutcome, matches: &MatchOutcome) -> ReconSummary {
    let valid = parse.valid.len();
    let matched = matches.matched().count();
    let unmatched = matches.unmatched().count();

    let sheets = matches
        .sheets
        .iter()
        .filter(|s| s.first_matches > 0)
        .map(|s| SheetRatio {
            document: s.document.clone(),
            sheet: s.sheet.clone(),
            found: s.first_matches,
            total: s.occupied_cells,
            ratio: (s.occupied_cells > 0).then(|| s.first_matches as f64 / s.occupied_cells as f64),
        })
        .collect();

    ReconSummary {
        total_modules: parse.total_modules,
        duplicates: parse.duplicates.len(),
        invalid: parse.invalid.len(),
        valid,
        matched,
        unmatched,
        match_percentage: match_percentage(matched, valid),
        sheets,
    }
}

/// `matched / valid * 100`, zero when nothing was valid.
pub fn match_percentage(matched: usize, valid: usize) -> f64 {
    if valid == 0 {
        0.0
    } else {
        matched as f64 / valid as f64 * 100.0
    }
}
