//! `shipcheck parse|run|validate|key`: registry parsing and shipment matching.

use std::path::{Path, PathBuf};

use serde::Serialize;
use shipcheck_io::{load_document, xlsx, Document, DELIMITED_EXTENSIONS, SPREADSHEET_EXTENSIONS};
use shipcheck_recon::engine::{assemble, parse_source};
use shipcheck_recon::model::{ParseOutcome, ReconResult, Record};
use shipcheck_recon::report;
use shipcheck_recon::validate::{validate, ModuleFormat, ValidationOutcome};
use shipcheck_recon::{ReconConfig, ShipmentMatcher, ShipmentSheet};

use crate::exit_codes::{
    recon_exit_code, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_IO, EXIT_RECON_UNMATCHED,
    EXIT_RECON_WRITE, EXIT_USAGE,
};
use crate::layout::LayoutArgs;
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

// ============================================================================
// Loading
// ============================================================================

fn check_input(path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Err(recon_err(EXIT_USAGE, format!("file not found: {}", path.display())));
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) && !DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(
            recon_err(EXIT_USAGE, format!("unsupported file type: {}", path.display())).with_hint(
                format!(
                    "supported: {}, {}",
                    SPREADSHEET_EXTENSIONS.join(", "),
                    DELIMITED_EXTENSIONS.join(", ")
                ),
            ),
        );
    }
    Ok(())
}

fn load(path: &Path) -> Result<Document, CliError> {
    check_input(path)?;
    load_document(path).map_err(|e| recon_err(EXIT_RECON_IO, e))
}

/// Load the registry and run extraction + deduplication.
fn parse_registry(source: &Path, config: &ReconConfig) -> Result<ParseOutcome, CliError> {
    let layout = config
        .layout()
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;
    let document = load(source)?;
    let grid = document
        .sheet(config.source.sheet.as_deref())
        .map_err(|e| recon_err(recon_exit_code(&e), format!("{}: {e}", document.name)))?;
    parse_source(&layout, grid).map_err(|e| recon_err(recon_exit_code(&e), format!("{}: {e}", document.name)))
}

// ============================================================================
// parse
// ============================================================================

pub fn cmd_parse(
    source: PathBuf,
    layout: LayoutArgs,
    report_path: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = layout.resolve()?;
    let parse = parse_registry(&source, &config)?;

    if let Some(ref path) = report_path {
        let source_layout = config
            .layout()
            .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;
        let tables = report::parse_report(&parse, &source_layout);
        write_xlsx(&tables, path)?;
    }

    if json_output {
        println!("{}", to_json(&parse)?);
    }

    eprintln!(
        "parsed {} module(s): {} valid, {} duplicate(s), {} invalid",
        parse.total_modules,
        parse.valid.len(),
        parse.duplicates.len(),
        parse.invalid.len(),
    );
    print_problems(&parse);
    Ok(())
}

fn print_problems(parse: &ParseOutcome) {
    for r in &parse.duplicates {
        eprintln!("  duplicate: {}", describe(r));
    }
    for r in &parse.invalid {
        eprintln!(
            "  invalid:   {} ({})",
            describe(r),
            r.invalid_reason.as_deref().unwrap_or("invalid")
        );
    }
}

fn describe(r: &Record) -> String {
    let mut s = format!("apartment {}", r.apartment);
    if !r.location.is_empty() {
        s.push_str(&format!(", {}", r.location));
    }
    s.push_str(&format!(", {} [{}]", r.display_identifier(), report::row_label(r.source_row)));
    s
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(
    source: PathBuf,
    shipments: Vec<PathBuf>,
    layout: LayoutArgs,
    out_dir: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = layout.resolve()?;
    let source_layout = config
        .layout()
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    // Fail on bad paths before any work is done
    for path in &shipments {
        check_input(path)?;
    }

    let parse = parse_registry(&source, &config)?;
    if parse.valid.is_empty() {
        log::warn!("no valid modules to search");
    }

    // Documents are loaded one at a time; stop once every key is found
    let mut matcher = ShipmentMatcher::new(&parse.valid);
    let mut corpus: Vec<ShipmentSheet> = Vec::new();
    let mut document_names: Vec<String> = Vec::new();
    for (i, path) in shipments.iter().enumerate() {
        if matcher.is_complete() {
            log::info!(
                "all {} key(s) found; {} document(s) not loaded",
                matcher.required_keys(),
                shipments.len() - i
            );
            break;
        }
        let mut document = load(path)?;
        document.name = unique_document_name(&document.name, &document_names);
        document_names.push(document.name.clone());
        for sheet in document.into_shipment_sheets() {
            matcher.offer(&sheet);
            corpus.push(sheet);
        }
    }

    let matches = matcher.finish(&parse.valid);
    let result = assemble(&config, parse, matches);

    let json_path = output_file.or_else(|| config.output.json.as_ref().map(PathBuf::from));
    if json_output || json_path.is_some() {
        let json_str = to_json(&result)?;
        if let Some(ref path) = json_path {
            std::fs::write(path, &json_str).map_err(|e| {
                recon_err(EXIT_RECON_WRITE, format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    if let Some(dir) = out_dir.or_else(|| config.output.dir.as_ref().map(PathBuf::from)) {
        write_run_documents(&dir, &result, &corpus, &source_layout)?;
    }

    print_run_summary(&result);

    if result.summary.unmatched > 0 {
        return Err(recon_err(
            EXIT_RECON_UNMATCHED,
            format!("{} module(s) not found in shipment documents", result.summary.unmatched),
        ));
    }
    Ok(())
}

/// Same-named files from different directories get " (n)" appended.
fn unique_document_name(name: &str, taken: &[String]) -> String {
    let mut candidate = name.to_string();
    let mut n = 2;
    while taken.iter().any(|t| t == &candidate) {
        candidate = format!("{name} ({n})");
        n += 1;
    }
    candidate
}

fn write_run_documents(
    dir: &Path,
    result: &ReconResult,
    corpus: &[ShipmentSheet],
    layout: &shipcheck_recon::SourceLayout,
) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        recon_err(EXIT_RECON_WRITE, format!("cannot create {}: {e}", dir.display()))
    })?;
    let now = chrono::Local::now();

    let report_path = dir.join(report::stamped_file_name("report", "xlsx", &now));
    write_xlsx(&report::match_report(result, corpus, layout), &report_path)?;

    let output_path = dir.join(report::stamped_file_name("output", "xlsx", &now));
    write_xlsx(&[report::output_table(&result.matches, layout)], &output_path)?;

    let export_path = dir.join(report::stamped_file_name("export", "csv", &now));
    shipcheck_io::csv::export_identifiers(&report::export_identifiers(&result.matches), &export_path)
        .map_err(|e| recon_err(EXIT_RECON_WRITE, e))?;
    eprintln!("wrote {}", export_path.display());
    Ok(())
}

fn print_run_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{} module(s): {} duplicate(s), {} invalid, {} valid",
        s.total_modules, s.duplicates, s.invalid, s.valid
    );
    eprintln!(
        "matched {} of {} ({:.2}%), {} not found",
        s.matched, s.valid, s.match_percentage, s.unmatched
    );
    for sheet in &s.sheets {
        eprintln!(
            "  {}: {}",
            shipcheck_recon::model::sheet_label(&sheet.document, &sheet.sheet),
            sheet.display()
        );
    }
    for r in result.matches.unmatched() {
        eprintln!("  not found: {}", describe(r));
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| recon_err(EXIT_RECON_IO, format!("cannot read config: {e}")))?;

    let config = ReconConfig::from_toml(&config_str)
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;
    let layout = config
        .layout()
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    eprintln!(
        "valid: '{}' ({} format), {} module column(s), location {}",
        config.name,
        config.format,
        layout.module_columns.len(),
        if layout.tracks_location() { "tracked" } else { "not tracked" },
    );
    Ok(())
}

// ============================================================================
// key
// ============================================================================

#[derive(Serialize)]
struct KeyReport {
    value: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub fn cmd_key(values: Vec<String>, format: ModuleFormat, json_output: bool) -> Result<(), CliError> {
    let reports: Vec<KeyReport> = values
        .into_iter()
        .map(|value| match validate(&value, &format) {
            ValidationOutcome::Valid { canonical, search_key } => KeyReport {
                value,
                valid: true,
                canonical: Some(canonical),
                search_key: Some(search_key),
                reason: None,
            },
            ValidationOutcome::Invalid { reason } => KeyReport {
                value,
                valid: false,
                canonical: None,
                search_key: None,
                reason: Some(reason),
            },
        })
        .collect();

    if json_output {
        println!("{}", to_json(&reports)?);
        return Ok(());
    }

    for r in &reports {
        match (&r.canonical, &r.search_key, &r.reason) {
            (Some(canonical), Some(key), _) => println!("{}\tvalid\t{}\t{}", r.value, canonical, key),
            (_, _, reason) => println!("{}\tinvalid\t{}", r.value, reason.as_deref().unwrap_or("")),
        }
    }
    Ok(())
}

// ============================================================================
// Output helpers
// ============================================================================

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| recon_err(EXIT_RECON_WRITE, format!("JSON serialization error: {e}")))
}

fn write_xlsx(tables: &[report::ReportTable], path: &Path) -> Result<(), CliError> {
    let result = xlsx::export(tables, path).map_err(|e| recon_err(EXIT_RECON_WRITE, e))?;
    log::debug!(
        "{}: {} sheet(s), {} cell(s)",
        path.display(),
        result.sheets_exported,
        result.cells_exported
    );
    eprintln!("wrote {}", path.display());
    Ok(())
}
