use crate::column::find_last_occupied_row;
use crate::config::{LocationMode, SourceLayout};
use crate::error::ReconError;
use crate::grid::TabularSource;
use crate::model::Record;
use crate::validate::validate;

/// Read one record per non-empty (row, module column) pair.
///
/// Rows without an apartment are skipped. Format-invalid records come back
/// with `status = Invalid`; everything else is `Pending` until deduplication.
pub fn extract<S: TabularSource + ?Sized>(
    source: &S,
    layout: &SourceLayout,
) -> Result<Vec<Record>, ReconError> {
    if layout.module_columns.is_empty() {
        return Err(ReconError::NoModuleColumns);
    }
    let range = source.occupied_range().ok_or(ReconError::EmptySource)?;

    let last_row = find_last_occupied_row(
        source,
        range.min_row..=range.max_row,
        &layout.columns_of_interest(),
    );
    let start_row = if layout.has_header_row {
        range.min_row + 1
    } else {
        range.min_row
    };

    // In per-header mode each module column carries its own location,
    // read once from the header row.
    let header_locations: Vec<String> = match layout.location {
        LocationMode::PerHeaderColumn => layout
            .module_columns
            .iter()
            .map(|&col| source.cell_text(range.min_row, col))
            .collect(),
        LocationMode::FixedColumn(_) | LocationMode::None => Vec::new(),
    };

    let mut records = Vec::new();
    for row in start_row..=last_row {
        let apartment = source.cell_text(row, layout.apartment_column);
        if apartment.is_empty() {
            continue;
        }

        let row_location = match layout.location {
            LocationMode::FixedColumn(col) => source.cell_text(row, col),
            LocationMode::PerHeaderColumn | LocationMode::None => String::new(),
        };

        for (i, &col) in layout.module_columns.iter().enumerate() {
            let raw = source.cell_text(row, col);
            if raw.is_empty() {
                continue;
            }
            let location = match layout.location {
                LocationMode::PerHeaderColumn => header_locations[i].clone(),
                LocationMode::FixedColumn(_) | LocationMode::None => row_location.clone(),
            };
            let outcome = validate(&raw, &layout.format);
            records.push(Record::from_outcome(
                apartment.clone(),
                location,
                raw,
                row + 1,
                outcome,
            ));
        }
    }

    log::debug!(
        "extracted {} module record(s) from rows {}..={}",
        records.len(),
        start_row + 1,
        last_row + 1
    );
    Ok(records)
}
