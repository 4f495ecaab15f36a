use thiserror::Error;

/// Failures that can reach the engine boundary.
///
/// Only configuration parsing and ledger ingestion can fail. Aggregation,
/// recognition splitting and validation are total functions over their input.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Missing required column in the ledger header.
    #[error("ledger: missing column '{0}'")]
    MissingColumn(String),

    /// Fiscal year cell is not an integer.
    #[error("ledger line {line}: cannot parse fiscal year '{value}'")]
    YearParse { line: u64, value: String },

    /// Amount cell is present but not a decimal number.
    #[error("ledger line {line}, column {column}: cannot parse amount '{value}'")]
    AmountParse { line: u64, column: String, value: String },

    /// Malformed CSV structure.
    #[error("ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
