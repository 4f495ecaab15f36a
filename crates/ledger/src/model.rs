use std::collections::BTreeSet;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// The five stored ledger quantities. `total` is always derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Amounts {
    #[serde(default)]
    pub charge: Decimal,
    #[serde(default)]
    pub write_off: Decimal,
    #[serde(default)]
    pub voluntary: Decimal,
    #[serde(default)]
    pub enforced: Decimal,
    #[serde(default)]
    pub pending: Decimal,
}

impl Amounts {
    pub fn new(
        charge: Decimal,
        write_off: Decimal,
        voluntary: Decimal,
        enforced: Decimal,
        pending: Decimal,
    ) -> Self {
        Self { charge, write_off, voluntary, enforced, pending }
    }

    /// Collected total: voluntary + enforced.
    pub fn total(&self) -> Decimal {
        self.voluntary + self.enforced
    }

    pub fn get(&self, field: AmountField) -> Decimal {
        match field {
            AmountField::Charge => self.charge,
            AmountField::WriteOff => self.write_off,
            AmountField::Voluntary => self.voluntary,
            AmountField::Enforced => self.enforced,
            AmountField::Pending => self.pending,
            AmountField::Total => self.total(),
        }
    }

    pub fn is_zero(&self) -> bool {
        AmountField::STORED.iter().all(|f| self.get(*f).is_zero())
    }
}

impl Add for Amounts {
    type Output = Amounts;

    fn add(self, rhs: Amounts) -> Amounts {
        Amounts {
            charge: self.charge + rhs.charge,
            write_off: self.write_off + rhs.write_off,
            voluntary: self.voluntary + rhs.voluntary,
            enforced: self.enforced + rhs.enforced,
            pending: self.pending + rhs.pending,
        }
    }
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, rhs: Amounts) {
        *self = *self + rhs;
    }
}

impl Sum for Amounts {
    fn sum<I: Iterator<Item = Amounts>>(iter: I) -> Amounts {
        iter.fold(Amounts::default(), Add::add)
    }
}

impl<'a> Sum<&'a Amounts> for Amounts {
    fn sum<I: Iterator<Item = &'a Amounts>>(iter: I) -> Amounts {
        iter.copied().sum()
    }
}

// Serialized with the derived total so presentation layers never recompute it.
impl Serialize for Amounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            charge: &'a Decimal,
            write_off: &'a Decimal,
            voluntary: &'a Decimal,
            enforced: &'a Decimal,
            pending: &'a Decimal,
            total: Decimal,
        }

        Wire {
            charge: &self.charge,
            write_off: &self.write_off,
            voluntary: &self.voluntary,
            enforced: &self.enforced,
            pending: &self.pending,
            total: self.total(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    Charge,
    WriteOff,
    Voluntary,
    Enforced,
    Pending,
    Total,
}

impl AmountField {
    /// Every compared field, in ledger column order.
    pub const ALL: [AmountField; 6] = [
        Self::Charge,
        Self::WriteOff,
        Self::Voluntary,
        Self::Enforced,
        Self::Pending,
        Self::Total,
    ];

    pub const STORED: [AmountField; 5] = [
        Self::Charge,
        Self::WriteOff,
        Self::Voluntary,
        Self::Enforced,
        Self::Pending,
    ];

    /// Ledger column label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Charge => "C_CARGO",
            Self::WriteOff => "C_DATAS",
            Self::Voluntary => "C_VOLUNTARIA",
            Self::Enforced => "C_EJECUTIVA",
            Self::Pending => "CC_PENDIENTE",
            Self::Total => "C_TOTAL",
        }
    }
}

impl std::fmt::Display for AmountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One ledger line: a fiscal year / concept / collection key combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TributeRecord {
    pub fiscal_year: i32,
    /// Free-text concept description as it appears in the ledger.
    pub concept: String,
    pub accounting_key: String,
    pub collection_key: String,
    #[serde(flatten)]
    pub amounts: Amounts,
}

impl TributeRecord {
    pub fn total(&self) -> Decimal {
        self.amounts.total()
    }
}

/// Externally documented totals for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseSummary {
    pub fiscal_year: i32,
    pub documented: Amounts,
    pub records: Vec<TributeRecord>,
}

impl ExerciseSummary {
    pub fn total(&self) -> Decimal {
        self.documented.total()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Aggregate root for one ingested ledger.
///
/// `documented_totals` come from an external source of truth and may disagree
/// with the sum of `records`; the validator exists to surface that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidationDocument {
    pub fiscal_year: i32,
    pub entity: String,
    pub records: Vec<TributeRecord>,
    pub exercise_summaries: Vec<ExerciseSummary>,
    pub documented_totals: Amounts,
}

impl LiquidationDocument {
    /// Assemble a document whose summaries and totals are derived from the
    /// records themselves, the way the ledger export documents them.
    pub fn from_records(entity: impl Into<String>, records: Vec<TributeRecord>) -> Self {
        let fiscal_year = records
            .iter()
            .map(|r| r.fiscal_year)
            .max()
            .unwrap_or_else(|| chrono::Local::now().year());

        let exercise_summaries = distinct_years(&records)
            .into_iter()
            .map(|year| {
                let year_records: Vec<TributeRecord> =
                    records.iter().filter(|r| r.fiscal_year == year).cloned().collect();
                ExerciseSummary {
                    fiscal_year: year,
                    documented: year_records.iter().map(|r| &r.amounts).sum(),
                    records: year_records,
                }
            })
            .collect();

        let documented_totals = records.iter().map(|r| &r.amounts).sum();

        Self {
            fiscal_year,
            entity: entity.into(),
            records,
            exercise_summaries,
            documented_totals,
        }
    }

    /// Replace documented values with externally supplied ones.
    pub fn with_documented(mut self, documented: crate::config::DocumentedTotals) -> Self {
        if let Some(totals) = documented.totals {
            self.documented_totals = totals;
        }

        for exercise in documented.exercises {
            match self
                .exercise_summaries
                .iter_mut()
                .find(|s| s.fiscal_year == exercise.fiscal_year)
            {
                Some(summary) => summary.documented = exercise.amounts,
                None => self.exercise_summaries.push(ExerciseSummary {
                    fiscal_year: exercise.fiscal_year,
                    documented: exercise.amounts,
                    records: Vec::new(),
                }),
            }
        }
        self.exercise_summaries.sort_by_key(|s| s.fiscal_year);
        self
    }

    pub fn records_by_year(&self, fiscal_year: i32) -> impl Iterator<Item = &TributeRecord> {
        self.records.iter().filter(move |r| r.fiscal_year == fiscal_year)
    }

    /// Records whose free-text concept description matches exactly.
    pub fn records_by_concept<'a>(
        &'a self,
        concept: &'a str,
    ) -> impl Iterator<Item = &'a TributeRecord> {
        self.records.iter().filter(move |r| r.concept == concept)
    }

    /// Records carrying a positive write-off ("datas").
    pub fn write_off_records(&self) -> Vec<TributeRecord> {
        self.records
            .iter()
            .filter(|r| r.amounts.write_off > Decimal::ZERO)
            .cloned()
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    /// Distinct fiscal years, ascending.
    pub fn years(&self) -> Vec<i32> {
        distinct_years(&self.records)
    }

    pub fn has_exercise_validation_errors(&self) -> bool {
        crate::validate::validate_exercises(self)
            .values()
            .any(|r| !r.is_valid)
    }
}

fn distinct_years(records: &[TributeRecord]) -> Vec<i32> {
    records
        .iter()
        .map(|r| r.fiscal_year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
