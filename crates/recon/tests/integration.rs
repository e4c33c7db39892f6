use shipcheck_recon::config::LocationMode;
use shipcheck_recon::matcher::{match_shipments, ShipmentMatcher};
use shipcheck_recon::report;
use shipcheck_recon::validate::{last_seven_digits, validate, ModuleFormat, ValidationOutcome};
use shipcheck_recon::{parse_source, run, Grid, ReconConfig, RecordStatus, ShipmentSheet};

const BLOCK_CONFIG: &str = r#"
name = "Block 7"
format = "prefixed_13"

[source]
apartment_column = "B"
module_columns = "D,E,F"

[source.location]
mode = "column"
column = "C"
"#;

fn registry() -> Grid {
    Grid::from_rows([
        vec!["#", "Apartment", "Location", "Kitchen", "Hall", "Bath"],
        vec!["1", "12", "Floor 2", "04B6481958134315", "04B0000000000101", ""],
        vec!["2", "13", "Floor 2", "04В0000000000202", "", "04B0000000000303"],
        vec!["3", "14", "Floor 3", "04B0000000000101", "oops", ""],
        vec!["4", "", "Floor 3", "04B0000000000999", "", ""],
        vec!["5", "15", "Floor 4", "", "", "04b0000000000404"],
    ])
}

fn shipments() -> Vec<ShipmentSheet> {
    vec![
        ShipmentSheet::new(
            "march.xlsx",
            "Pallets",
            Grid::from_rows([
                vec!["Serial", "Qty"],
                vec!["SN-8134315-X", "1"],
                vec!["0000303", "1"],
            ]),
        ),
        ShipmentSheet::new(
            "april.xlsx",
            "Pallets",
            Grid::from_rows([vec!["Serial"], vec!["8134315"], vec!["0000202"]]),
        ),
        ShipmentSheet::new("april.xlsx", "Notes", Grid::new()),
    ]
}

fn config() -> ReconConfig {
    ReconConfig::from_toml(BLOCK_CONFIG).unwrap()
}

// -------------------------------------------------------------------------
// Parsing
// -------------------------------------------------------------------------

#[test]
fn registry_parse_partitions_every_module() {
    let layout = config().layout().unwrap();
    let parse = parse_source(&layout, &registry()).unwrap();

    // Row 5 has no apartment and is skipped entirely.
    assert_eq!(parse.total_modules, 7);
    assert_eq!(parse.duplicates.len(), 2);
    assert_eq!(parse.invalid.len(), 1);
    assert_eq!(parse.valid.len(), 4);

    let dup_apartments: Vec<&str> = parse.duplicates.iter().map(|r| r.apartment.as_str()).collect();
    assert_eq!(dup_apartments, vec!["12", "14"]);
    assert_eq!(parse.invalid[0].raw_identifier, "oops");
    assert_eq!(parse.invalid[0].source_row, 4);
}

#[test]
fn cyrillic_ve_is_normalized() {
    let layout = config().layout().unwrap();
    let parse = parse_source(&layout, &registry()).unwrap();
    let rec = parse
        .valid
        .iter()
        .find(|r| r.apartment == "13" && r.location == "Floor 2" && r.raw_identifier.contains('В'))
        .unwrap();
    assert_eq!(rec.canonical.as_deref(), Some("04B0000000000202"));
    assert_eq!(rec.search_key.as_deref(), Some("0000202"));
}

#[test]
fn parse_is_idempotent() {
    let layout = config().layout().unwrap();
    let a = parse_source(&layout, &registry()).unwrap();
    let b = parse_source(&layout, &registry()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn every_valid_record_has_key_and_canonical() {
    let layout = config().layout().unwrap();
    let parse = parse_source(&layout, &registry()).unwrap();
    for r in parse.valid.iter().chain(&parse.duplicates) {
        assert!(r.canonical.is_some());
        assert!(r.search_key.is_some());
    }
    for r in &parse.invalid {
        assert_eq!(r.status, RecordStatus::Invalid);
        assert!(r.canonical.is_none());
        assert!(r.search_key.is_none());
    }
}

#[test]
fn per_header_locations() {
    let input = r#"
[source]
apartment_column = "B"
module_columns = "D,F"

[source.location]
mode = "header"
"#;
    let config = ReconConfig::from_toml(input).unwrap();
    let layout = config.layout().unwrap();
    assert_eq!(layout.location, LocationMode::PerHeaderColumn);
    let parse = parse_source(&layout, &registry()).unwrap();
    let bath = parse.valid.iter().find(|r| r.apartment == "15").unwrap();
    assert_eq!(bath.location, "Bath");
}

// -------------------------------------------------------------------------
// Validation
// -------------------------------------------------------------------------

#[test]
fn search_key_is_deterministic_across_formats() {
    for value in ["04B6481958134315", "SN-8134315-X", "8134315", "x8134315"] {
        assert_eq!(last_seven_digits(value), "8134315", "{value}");
    }
    assert_eq!(
        last_seven_digits("04B6481958134315000"),
        last_seven_digits("...134315000")
    );
    assert_eq!(last_seven_digits("...134315000"), "4315000");
    assert_eq!(last_seven_digits("12-34"), "0001234");
    assert_eq!(last_seven_digits("  no digits "), "no digits");
}

#[test]
fn digit_zri_format() {
    match validate("5zri0123456789", &ModuleFormat::DigitZri10) {
        ValidationOutcome::Valid { canonical, search_key } => {
            assert_eq!(canonical, "5ZRI0123456789");
            assert_eq!(search_key, "3456789");
        }
        other => panic!("expected valid, got {other:?}"),
    }
    assert!(!validate("04B6481958134315", &ModuleFormat::DigitZri10).is_valid());
}

// -------------------------------------------------------------------------
// Matching
// -------------------------------------------------------------------------

#[test]
fn full_run_first_match_wins() {
    let corpus = shipments();
    let result = run(&config(), &registry(), &corpus).unwrap();

    let index = &result.matches.index;
    assert_eq!(index["8134315"].document, "march.xlsx");
    assert_eq!(index["0000303"].document, "march.xlsx");
    assert_eq!(index["0000202"].document, "april.xlsx");
    assert!(!index.contains_key("0000404"));

    assert_eq!(result.summary.valid, 4);
    assert_eq!(result.summary.matched, 3);
    assert_eq!(result.summary.unmatched, 1);
    assert!((result.summary.match_percentage - 75.0).abs() < 1e-9);

    // The empty "Notes" sheet still gets scanned: one key is still missing.
    assert_eq!(result.matches.sheets.len(), 3);
    assert!(result.matches.sheets[2].scanned);

    let ratios: Vec<String> = result.summary.sheets.iter().map(|s| s.display()).collect();
    assert_eq!(ratios, vec!["2 / 6", "1 / 3"]);
}

#[test]
fn matched_plus_unmatched_is_valid() {
    let corpus = shipments();
    let result = run(&config(), &registry(), &corpus).unwrap();
    assert_eq!(
        result.summary.matched + result.summary.unmatched,
        result.summary.valid
    );
}

#[test]
fn incremental_documents_stop_once_complete() {
    let layout = config().layout().unwrap();
    let parse = parse_source(&layout, &registry()).unwrap();
    let only_found: Vec<_> = parse
        .valid
        .iter()
        .filter(|r| r.apartment != "15")
        .cloned()
        .collect();

    let mut matcher = ShipmentMatcher::new(&only_found);
    let corpus = shipments();
    let mut documents_loaded = 0;
    for document in ["march.xlsx", "april.xlsx"] {
        if matcher.is_complete() {
            break;
        }
        documents_loaded += 1;
        for sheet in corpus.iter().filter(|s| s.document == document) {
            matcher.offer(sheet);
        }
    }
    assert_eq!(documents_loaded, 2);
    assert!(matcher.is_complete());

    let out = matcher.finish(&only_found);
    assert_eq!(out.unmatched().count(), 0);
    // "Notes" arrived after every key was found and was never scanned.
    assert!(!out.sheets[2].scanned);
    assert_eq!(out.index, match_shipments(&only_found, &corpus).index);
}

#[test]
fn empty_registry_sheet_is_rejected() {
    let err = run(&config(), &Grid::new(), &shipments()).unwrap_err();
    assert_eq!(err.to_string(), "source sheet is empty");
}

// -------------------------------------------------------------------------
// Reports
// -------------------------------------------------------------------------

#[test]
fn match_report_tables() {
    let corpus = shipments();
    let config = config();
    let layout = config.layout().unwrap();
    let result = run(&config, &registry(), &corpus).unwrap();

    let tables = report::match_report(&result, &corpus, &layout);
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Results",
            "Statistics",
            "Not found",
            "Duplicates",
            "Invalid records",
            "Shipment 1 (Pallets)",
            "Shipment 2 (Pallets)",
        ]
    );

    let output = report::output_table(&result.matches, &layout);
    assert_eq!(output.rows.len(), 3);

    let export = report::export_identifiers(&result.matches);
    assert_eq!(
        export,
        vec!["04B6481958134315", "04B0000000000202", "04B0000000000303"]
    );
}
