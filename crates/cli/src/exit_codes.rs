//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | Differences found (`diff`, `recon run`)              |
//! | 2    | Usage error (bad args, unsupported file type)        |
//! | 3    | I/O error reading or writing a roster                |
//! | 4    | Missing input (empty roster, unknown source)         |
//! | 5    | Invalid recon config                                 |
//! | 6    | Edit grant refused                                   |
//! | 7    | Internal error (serialization, review-state misuse)  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `engine_exit_code` or the relevant command

use census_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found between the current census and the combined rosters.
/// Like `diff(1)`, exit 1 means "files differ."
pub const EXIT_DIFFERENCES: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A roster or output file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Fewer non-empty rosters than required, or a configured source has no rows.
pub const EXIT_MISSING_INPUT: u8 = 4;

/// Recon config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// No manager found for the email, or the manager manages nobody.
pub const EXIT_GRANT_REFUSED: u8 = 6;

/// Internal failure with no more specific code. Never shares a code with
/// "differences found".
pub const EXIT_INTERNAL: u8 = 7;

/// Map an engine error to its exit code.
pub fn engine_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingInput { .. } | ReconError::MissingSource(_) => EXIT_MISSING_INPUT,
        ReconError::UnknownAuthority { .. } | ReconError::NoManagedEmployees { .. } => {
            EXIT_GRANT_REFUSED
        }
        ReconError::Io(_) => EXIT_IO,
        ReconError::UnresolvedIdentifier(_)
        | ReconError::NotEditable { .. }
        | ReconError::UnknownField { .. } => EXIT_INTERNAL,
    }
}
