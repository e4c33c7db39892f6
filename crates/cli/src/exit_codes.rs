//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                  |
//! |---------|-----------|----------------------------------------------|
//! | 0       | Universal | Success                                      |
//! | 2       | Universal | CLI usage error (bad args, missing file)     |
//! | 60-69   | recon     | Registry parsing and shipment matching codes |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use shipcheck_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing input file, unsupported file type.
/// clap also exits with 2 on argument parse failures.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file or layout flags are invalid (bad column label, no module
/// columns, missing location column, unknown sheet, TOML errors).
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Registry sheet has no occupied cells.
pub const EXIT_RECON_EMPTY_SOURCE: u8 = 61;

/// A source, shipment or config file could not be read.
pub const EXIT_RECON_IO: u8 = 62;

/// Matching finished but some valid modules were not found in any shipment.
/// Reports are still written before exiting with this code.
pub const EXIT_RECON_UNMATCHED: u8 = 63;

/// A report, export or JSON output file could not be written.
pub const EXIT_RECON_WRITE: u8 = 64;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    if err.is_configuration() {
        EXIT_RECON_INVALID_CONFIG
    } else {
        EXIT_RECON_EMPTY_SOURCE
    }
}
