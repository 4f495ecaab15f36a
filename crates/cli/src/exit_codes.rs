//! CLI Exit Code Registry
//!
//! Single source of truth for `opaef` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success (and, for `validate`, fully reconciled)  |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args, unreadable input path)    |
//! | 3    | Documented totals do not reconcile               |
//! | 4    | Grouping or documented-totals config is invalid  |
//! | 5    | Ledger input could not be parsed                 |
//!
//! To add a code: add the constant, document its trigger, update the table.

/// Success.
pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments or a path that cannot be read/written.
pub const EXIT_USAGE: u8 = 2;

/// `validate` found at least one discrepancy outside tolerance.
pub const EXIT_MISMATCH: u8 = 3;

/// TOML config failed to parse.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Ledger CSV is malformed (missing column, bad year or amount).
pub const EXIT_INPUT: u8 = 5;
