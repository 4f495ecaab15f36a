//! Input loading and the `--json` stdout contract shared by commands.

use std::path::{Path, PathBuf};

use opaef_ledger::{DocumentedTotals, GroupingConfig, LiquidationDocument};
use serde::Serialize;

use crate::exit_codes::EXIT_ERROR;
use crate::CliError;

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))
}

pub(crate) fn load_ledger(path: &Path) -> Result<LiquidationDocument, CliError> {
    let data = read(path)?;
    opaef_ledger::load_ledger_csv(&data).map_err(|e| CliError::ledger(path, e))
}

pub(crate) fn load_grouping(path: Option<&Path>) -> Result<GroupingConfig, CliError> {
    match path {
        Some(path) => {
            let data = read(path)?;
            GroupingConfig::from_toml(&data).map_err(|e| CliError::ledger(path, e))
        }
        None => Ok(GroupingConfig::default()),
    }
}

pub(crate) fn load_documented(path: &Path) -> Result<DocumentedTotals, CliError> {
    let data = read(path)?;
    DocumentedTotals::from_toml(&data).map_err(|e| CliError::ledger(path, e))
}

#[derive(Serialize)]
pub(crate) struct Meta {
    pub engine_version: &'static str,
    pub generated_at: String,
    pub ledger: PathBuf,
    pub entity: String,
}

impl Meta {
    pub(crate) fn new(ledger: &Path, document: &LiquidationDocument) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION"),
            generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ledger: ledger.to_path_buf(),
            entity: document.entity.clone(),
        }
    }
}

/// One JSON value: `{"meta": ..., <key>: <body>}`.
pub(crate) fn to_json<T: Serialize>(meta: &Meta, key: &str, body: &T) -> Result<String, CliError> {
    let mut value = serde_json::json!({ "meta": meta });
    let body = serde_json::to_value(body).map_err(json_err)?;
    if let Some(map) = value.as_object_mut() {
        map.insert(key.to_string(), body);
    }
    serde_json::to_string_pretty(&value).map_err(json_err)
}

fn json_err(e: serde_json::Error) -> CliError {
    CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    }
}

pub(crate) fn write_output(path: &Path, json: &str) -> Result<(), CliError> {
    std::fs::write(path, json)
        .map_err(|e| CliError::usage(format!("cannot write {}: {e}", path.display())))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
