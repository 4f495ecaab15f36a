//! Reconciliation of computed sums against documented totals.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::model::{AmountField, Amounts, LiquidationDocument};

/// Absolute difference treated as rounding noise.
pub const TOLERANCE: Decimal = dec!(0.01);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub field: AmountField,
    pub computed: Decimal,
    pub documented: Decimal,
}

impl Discrepancy {
    /// Signed `computed - documented`.
    pub fn difference(&self) -> Decimal {
        self.computed - self.documented
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: computed {} vs documented {}",
            self.field, self.computed, self.documented
        )
    }
}

/// Field-by-field comparison, in ledger column order.
pub fn compare(computed: &Amounts, documented: &Amounts) -> Vec<Discrepancy> {
    AmountField::ALL
        .iter()
        .filter_map(|&field| {
            let (c, d) = (computed.get(field), documented.get(field));
            ((c - d).abs() > TOLERANCE).then_some(Discrepancy {
                field,
                computed: c,
                documented: d,
            })
        })
        .collect()
}

/// Sum of every record against the document-level totals.
pub fn validate_document(document: &LiquidationDocument) -> Vec<Discrepancy> {
    let computed: Amounts = document.records.iter().map(|r| &r.amounts).sum();
    compare(&computed, &document.documented_totals)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseValidationResult {
    pub fiscal_year: i32,
    pub is_valid: bool,
    pub computed: Amounts,
    pub documented: Amounts,
    pub errors: Vec<String>,
}

/// Per-year check of each exercise summary against that year's records.
pub fn validate_exercises(document: &LiquidationDocument) -> BTreeMap<i32, ExerciseValidationResult> {
    document
        .exercise_summaries
        .iter()
        .map(|summary| {
            let year = summary.fiscal_year;
            let computed: Amounts = document.records_by_year(year).map(|r| &r.amounts).sum();
            let errors: Vec<String> = compare(&computed, &summary.documented)
                .iter()
                .map(ToString::to_string)
                .collect();
            let result = ExerciseValidationResult {
                fiscal_year: year,
                is_valid: errors.is_empty(),
                computed,
                documented: summary.documented,
                errors,
            };
            (year, result)
        })
        .collect()
}

/// Both validators over one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub discrepancies: Vec<Discrepancy>,
    pub exercises: BTreeMap<i32, ExerciseValidationResult>,
}

impl ValidationReport {
    pub fn run(document: &LiquidationDocument) -> Self {
        let report = Self {
            discrepancies: validate_document(document),
            exercises: validate_exercises(document),
        };
        tracing::debug!(
            discrepancies = report.discrepancies.len(),
            exercises = report.exercises.len(),
            failing = report.failing_years().len(),
            "validation complete"
        );
        report
    }

    pub fn is_reconciled(&self) -> bool {
        self.discrepancies.is_empty() && self.exercises.values().all(|r| r.is_valid)
    }

    pub fn failing_years(&self) -> Vec<i32> {
        self.exercises
            .values()
            .filter(|r| !r.is_valid)
            .map(|r| r.fiscal_year)
            .collect()
    }
}
