//! `opaef-ledger`: dimensional aggregation and reconciliation engine for
//! annual tax-collection ledgers.
//!
//! Pure engine crate: receives ingested records and a grouping configuration,
//! returns a grouping tree and reconciliation results. No CLI dependencies.

pub mod aggregate;
pub mod concept;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod recognition;
pub mod validate;

pub use aggregate::{build_tree, build_tree_with, GroupNode, Layout, NodeKind};
pub use concept::{resolve_code, ConceptRegistry, UNRESOLVED_CONCEPT};
pub use config::{Assignment, CustomGroup, DocumentedTotals, GroupingConfig};
pub use error::{LedgerError, LedgerResult};
pub use ingest::load_ledger_csv;
pub use model::{AmountField, Amounts, ExerciseSummary, LiquidationDocument, TributeRecord};
pub use recognition::{
    assign_recognition_years, build_recognition_tree, build_recognition_tree_with,
    split_recognition_years, MANAGED_CONCEPTS,
};
pub use validate::{
    validate_document, validate_exercises, Discrepancy, ExerciseValidationResult,
    ValidationReport, TOLERANCE,
};
