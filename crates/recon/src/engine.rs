use crate::config::{ReconConfig, SourceLayout};
use crate::dedup::partition;
use crate::error::ReconError;
use crate::extract::extract;
use crate::grid::{ShipmentSheet, TabularSource};
use crate::matcher::ShipmentMatcher;
use crate::model::{MatchOutcome, ParseOutcome, ReconMeta, ReconResult};
use crate::stats::compute_summary;

/// Extract and deduplicate the registry sheet.
pub fn parse_source<S: TabularSource + ?Sized>(
    layout: &SourceLayout,
    source: &S,
) -> Result<ParseOutcome, ReconError> {
    let records = extract(source, layout)?;
    let total_modules = records.len();
    let split = partition(records);

    log::info!(
        "parsed {} module(s): {} valid, {} duplicate, {} invalid",
        total_modules,
        split.valid.len(),
        split.duplicates.len(),
        split.invalid.len()
    );

    Ok(ParseOutcome {
        total_modules,
        valid: split.valid,
        duplicates: split.duplicates,
        invalid: split.invalid,
    })
}

/// Build the final result from a parse outcome and a finished matcher.
///
/// Used directly by callers that feed shipment documents incrementally.
pub fn assemble(config: &ReconConfig, parse: ParseOutcome, matches: MatchOutcome) -> ReconResult {
    let summary = compute_summary(&parse, &matches);
    ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            format: config.format.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        parse,
        matches,
    }
}

/// Run the whole pipeline against an already loaded shipment corpus.
pub fn run<S: TabularSource + ?Sized>(
    config: &ReconConfig,
    source: &S,
    shipments: &[ShipmentSheet],
) -> Result<ReconResult, ReconError> {
    let layout = config.layout()?;
    let parse = parse_source(&layout, source)?;

    let mut matcher = ShipmentMatcher::new(&parse.valid);
    let pulled = matcher.offer_all(shipments);
    log::debug!("scanned {pulled} of {} shipment sheet(s)", shipments.len());
    let matches = matcher.finish(&parse.valid);

    Ok(assemble(config, parse, matches))
}
