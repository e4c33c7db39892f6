use std::collections::HashSet;

use crate::grid::ShipmentSheet;
use crate::model::{MatchIndex, MatchLocation, MatchOutcome, MatchRow, Record, SheetTally};
use crate::validate::last_seven_digits;

/// Folds shipment sheets, one at a time, into a first-match-wins index.
///
/// Sheets may arrive incrementally (one document per user-supplied file);
/// previously scanned sheets are never revisited. Once every required key
/// has been found, further sheets are not scanned.
#[derive(Debug, Clone)]
pub struct ShipmentMatcher {
    required: HashSet<String>,
    index: MatchIndex,
    sheets: Vec<SheetTally>,
}

impl ShipmentMatcher {
    pub fn new<'a, I>(valid: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let required = valid
            .into_iter()
            .filter_map(|r| r.search_key.clone())
            .collect();
        Self {
            required,
            index: MatchIndex::new(),
            sheets: Vec::new(),
        }
    }

    pub fn required_keys(&self) -> usize {
        self.required.len()
    }

    pub fn found_keys(&self) -> usize {
        self.index.len()
    }

    pub fn is_complete(&self) -> bool {
        self.index.len() >= self.required.len()
    }

    pub fn index(&self) -> &MatchIndex {
        &self.index
    }

    /// Scan one sheet in row-major order. Returns the number of keys whose
    /// first occurrence is on this sheet.
    pub fn offer(&mut self, sheet: &ShipmentSheet) -> usize {
        let mut tally = SheetTally {
            document: sheet.document.clone(),
            sheet: sheet.sheet.clone(),
            occupied_cells: sheet.occupied_cells,
            first_matches: 0,
            scanned: false,
        };

        if self.is_complete() {
            log::debug!("skipping '{}' / '{}': all keys already found", sheet.document, sheet.sheet);
            self.sheets.push(tally);
            return 0;
        }

        tally.scanned = true;
        for (_, _, text) in sheet.grid.cells() {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            let key = last_seven_digits(text);
            if self.required.contains(&key) && !self.index.contains_key(&key) {
                self.index.insert(
                    key,
                    MatchLocation {
                        document: sheet.document.clone(),
                        sheet: sheet.sheet.clone(),
                    },
                );
                tally.first_matches += 1;
            }
        }

        log::info!(
            "scanned '{}' / '{}': {} new match(es), {}/{} keys found",
            sheet.document,
            sheet.sheet,
            tally.first_matches,
            self.index.len(),
            self.required.len()
        );
        let hits = tally.first_matches;
        self.sheets.push(tally);
        hits
    }

    /// Consume sheets in order until every key is found. Returns how many
    /// sheets were pulled from `sheets`.
    pub fn offer_all<'a, I>(&mut self, sheets: I) -> usize
    where
        I: IntoIterator<Item = &'a ShipmentSheet>,
    {
        let mut pulled = 0;
        for sheet in sheets {
            if self.is_complete() {
                log::info!("all {} key(s) found; remaining sheets not scanned", self.required.len());
                break;
            }
            self.offer(sheet);
            pulled += 1;
        }
        pulled
    }

    /// Classify every valid record against the final index.
    pub fn finish(self, valid: &[Record]) -> MatchOutcome {
        let rows = valid
            .iter()
            .map(|record| MatchRow {
                location: record
                    .search_key
                    .as_ref()
                    .and_then(|key| self.index.get(key))
                    .cloned(),
                record: record.clone(),
            })
            .collect();
        MatchOutcome {
            required_keys: self.required.len(),
            index: self.index,
            sheets: self.sheets,
            rows,
        }
    }
}

/// One-shot matching over a fully loaded corpus.
pub fn match_shipments(valid: &[Record], corpus: &[ShipmentSheet]) -> MatchOutcome {
    let mut matcher = ShipmentMatcher::new(valid);
    matcher.offer_all(corpus);
    matcher.finish(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::model::RecordStatus;
    use crate::validate::{validate, ModuleFormat};

    fn valid(raw: &str) -> Record {
        let mut r = Record::from_outcome(
            "1".into(),
            String::new(),
            raw.into(),
            2,
            validate(raw, &ModuleFormat::Prefixed13),
        );
        r.status = RecordStatus::Valid;
        r
    }

    fn sheet(doc: &str, name: &str, rows: Vec<Vec<&str>>) -> ShipmentSheet {
        ShipmentSheet::new(doc, name, Grid::from_rows(rows))
    }

    #[test]
    fn suffix_match_across_formats() {
        let records = vec![valid("04B6481958134315")];
        let corpus = vec![sheet("ship.xlsx", "May", vec![vec!["Serial"], vec!["SN-8134315-X"]])];
        let out = match_shipments(&records, &corpus);
        assert_eq!(out.index["8134315"].document, "ship.xlsx");
        assert_eq!(out.index["8134315"].sheet, "May");
        assert_eq!(out.matched().count(), 1);
        assert_eq!(out.unmatched().count(), 0);
    }

    #[test]
    fn first_match_wins() {
        let records = vec![valid("04B6481958134315"), valid("04B0000000000001")];
        let corpus = vec![
            sheet("a.xlsx", "S1", vec![vec!["8134315"]]),
            sheet("b.xlsx", "S1", vec![vec!["04B6481958134315", "0000001"]]),
        ];
        let out = match_shipments(&records, &corpus);
        assert_eq!(out.index["8134315"].document, "a.xlsx");
        assert_eq!(out.index["0000001"].document, "b.xlsx");
        assert_eq!(out.sheets[0].first_matches, 1);
        assert_eq!(out.sheets[1].first_matches, 1);
    }

    #[test]
    fn stops_between_sheets_once_complete() {
        let records = vec![valid("04B6481958134315")];
        let corpus = vec![
            sheet("a.xlsx", "S1", vec![vec!["8134315"]]),
            sheet("a.xlsx", "S2", vec![vec!["8134315"]]),
            sheet("b.xlsx", "S1", vec![vec!["x"]]),
        ];
        let mut matcher = ShipmentMatcher::new(&records);
        let pulled = matcher.offer_all(&corpus);
        assert_eq!(pulled, 1);
        assert!(matcher.is_complete());
        let out = matcher.finish(&records);
        assert_eq!(out.sheets.len(), 1);
    }

    #[test]
    fn sheet_in_progress_is_finished() {
        // Completion is only checked between sheets; the current sheet's tally
        // still counts every first match on it.
        let records = vec![valid("04B0000000000001"), valid("04B0000000000002")];
        let corpus = vec![sheet("a.xlsx", "S1", vec![vec!["1", "2", "1"]])];
        let out = match_shipments(&records, &corpus);
        assert_eq!(out.sheets[0].first_matches, 2);
        assert_eq!(out.sheets[0].occupied_cells, 3);
    }

    #[test]
    fn incremental_arrival_matches_batch() {
        let records = vec![
            valid("04B6481958134315"),
            valid("04B0000000000001"),
            valid("04B0000000000002"),
        ];
        let corpus = vec![
            sheet("a.xlsx", "S1", vec![vec!["0000001"]]),
            sheet("b.xlsx", "S1", vec![vec!["8134315"], vec!["0000001"]]),
        ];

        let batch = match_shipments(&records, &corpus);

        let mut matcher = ShipmentMatcher::new(&records);
        matcher.offer(&corpus[0]);
        assert_eq!(matcher.found_keys(), 1);
        matcher.offer(&corpus[1]);
        let incremental = matcher.finish(&records);

        assert_eq!(batch.index, incremental.index);
        assert_eq!(incremental.unmatched().count(), 1);
    }

    #[test]
    fn offer_after_complete_records_unscanned_sheet() {
        let records = vec![valid("04B6481958134315")];
        let mut matcher = ShipmentMatcher::new(&records);
        matcher.offer(&sheet("a.xlsx", "S1", vec![vec!["8134315"]]));
        let hits = matcher.offer(&sheet("b.xlsx", "S1", vec![vec!["8134315"]]));
        assert_eq!(hits, 0);
        let out = matcher.finish(&records);
        assert!(!out.sheets[1].scanned);
        assert_eq!(out.index["8134315"].document, "a.xlsx");
    }

    #[test]
    fn completeness_holds() {
        let records = vec![
            valid("04B6481958134315"),
            valid("04B0000000000001"),
            valid("04B0000000000009"),
        ];
        let corpus = vec![
            sheet("a.xlsx", "Empty", vec![]),
            sheet("b.xlsx", "S1", vec![vec!["junk", "0000009"]]),
        ];
        let out = match_shipments(&records, &corpus);
        assert_eq!(out.matched().count() + out.unmatched().count(), records.len());
        assert_eq!(out.matched().count(), 1);
        assert_eq!(out.sheets[0].first_matches, 0);
    }

    #[test]
    fn shared_suffix_matches_both_records() {
        let records = vec![valid("04B1111118134315"), valid("04B2222228134315")];
        let corpus = vec![sheet("a.xlsx", "S1", vec![vec!["8134315"]])];
        let out = match_shipments(&records, &corpus);
        assert_eq!(out.required_keys, 1);
        assert_eq!(out.matched().count(), 2);
    }

    #[test]
    fn no_valid_records_scans_nothing() {
        let corpus = vec![sheet("a.xlsx", "S1", vec![vec!["8134315"]])];
        let out = match_shipments(&[], &corpus);
        assert!(out.index.is_empty());
        assert!(out.sheets.is_empty());
    }
}
