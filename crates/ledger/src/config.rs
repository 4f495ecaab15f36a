use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::model::Amounts;

// ---------------------------------------------------------------------------
// Grouping config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_true")]
    pub group_by_year: bool,
    #[serde(default = "default_true")]
    pub group_by_concept: bool,
    #[serde(default)]
    pub group_by_custom: bool,
    #[serde(default)]
    pub custom_groups: Vec<CustomGroup>,
    /// Persisted display names, keyed by concept code.
    #[serde(default)]
    pub concept_names: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            group_by_year: true,
            group_by_concept: true,
            group_by_custom: false,
            custom_groups: Vec::new(),
            concept_names: BTreeMap::new(),
        }
    }
}

/// A user-defined bucket of concept codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomGroup {
    pub name: String,
    #[serde(default)]
    pub concept_codes: Vec<String>,
}

impl CustomGroup {
    pub fn new(name: impl Into<String>, codes: &[&str]) -> Self {
        Self {
            name: name.into(),
            concept_codes: codes.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Which custom group, if any, owns a concept code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assignment {
    Unassigned,
    /// Position of the owning group in configured order.
    AssignedTo(usize),
}

/// First-match-wins ownership of concept codes, computed once per pass.
#[derive(Debug, Clone, Default)]
pub struct Ownership {
    owners: HashMap<String, usize>,
}

impl Ownership {
    pub fn assignment(&self, code: &str) -> Assignment {
        match self.owners.get(code) {
            Some(&index) => Assignment::AssignedTo(index),
            None => Assignment::Unassigned,
        }
    }
}

impl GroupingConfig {
    pub fn from_toml(input: &str) -> Result<Self, LedgerError> {
        let config: GroupingConfig =
            toml::from_str(input).map_err(|e| LedgerError::ConfigParse(e.to_string()))?;
        for warning in config.lint() {
            tracing::warn!(%warning, "grouping config");
        }
        Ok(config)
    }

    /// Custom grouping only takes effect with at least one group defined.
    pub fn custom_grouping_active(&self) -> bool {
        self.group_by_custom && !self.custom_groups.is_empty()
    }

    /// No dimension active: the engine falls back to a flat listing.
    pub fn is_flat(&self) -> bool {
        !self.group_by_year && !self.group_by_concept && !self.custom_grouping_active()
    }

    pub fn ownership(&self) -> Ownership {
        let mut owners = HashMap::new();
        for (index, group) in self.custom_groups.iter().enumerate() {
            for code in &group.concept_codes {
                owners.entry(code.clone()).or_insert(index);
            }
        }
        Ownership { owners }
    }

    /// Owner of a single code, without building the full ownership table.
    pub fn custom_group_for(&self, code: &str) -> Option<&CustomGroup> {
        self.custom_groups
            .iter()
            .find(|g| g.concept_codes.iter().any(|c| c == code))
    }

    /// Configuration oddities that degrade silently at aggregation time.
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.group_by_custom && self.custom_groups.is_empty() {
            warnings.push("group_by_custom is set but no custom groups are defined".to_string());
        }

        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for group in &self.custom_groups {
            if group.name.trim().is_empty() {
                warnings.push("custom group with a blank name".to_string());
            }
            if group.concept_codes.is_empty() {
                warnings.push(format!("custom group '{}' lists no concept codes", group.name));
            }
            for code in &group.concept_codes {
                if let Some(owner) = claimed.get(code.as_str()) {
                    if *owner != group.name {
                        warnings.push(format!(
                            "concept '{code}' is listed by '{owner}' and '{}'; '{owner}' keeps it",
                            group.name
                        ));
                    }
                } else {
                    claimed.insert(code, &group.name);
                }
            }
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Documented totals
// ---------------------------------------------------------------------------

/// Externally documented values that override the ones derived at ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentedTotals {
    #[serde(default)]
    pub totals: Option<Amounts>,
    #[serde(default)]
    pub exercises: Vec<DocumentedExercise>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentedExercise {
    pub fiscal_year: i32,
    #[serde(flatten)]
    pub amounts: Amounts,
}

impl DocumentedTotals {
    pub fn from_toml(input: &str) -> Result<Self, LedgerError> {
        toml::from_str(input).map_err(|e| LedgerError::ConfigParse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FULL: &str = r#"
group_by_year = true
group_by_concept = false
group_by_custom = true

[[custom_groups]]
name = "IBI"
concept_codes = ["102", "204"]

[[custom_groups]]
name = "Vehiculos"
concept_codes = ["205", "102"]

[concept_names]
"102" = "IBI URBANA"
"#;

    #[test]
    fn parse_full() {
        let config = GroupingConfig::from_toml(FULL).unwrap();
        assert!(config.group_by_year);
        assert!(!config.group_by_concept);
        assert!(config.custom_grouping_active());
        assert_eq!(config.custom_groups.len(), 2);
        assert_eq!(config.custom_groups[1].concept_codes, vec!["205", "102"]);
        assert_eq!(config.concept_names["102"], "IBI URBANA");
    }

    #[test]
    fn defaults_when_empty() {
        let config = GroupingConfig::from_toml("").unwrap();
        assert_eq!(config, GroupingConfig::default());
        assert!(!config.is_flat());
    }

    #[test]
    fn custom_without_groups_is_inactive() {
        let config = GroupingConfig::from_toml(
            "group_by_year = false\ngroup_by_concept = false\ngroup_by_custom = true\n",
        )
        .unwrap();
        assert!(!config.custom_grouping_active());
        assert!(config.is_flat());
        assert_eq!(config.lint().len(), 1);
    }

    #[test]
    fn first_group_owns_shared_code() {
        let config = GroupingConfig::from_toml(FULL).unwrap();
        let ownership = config.ownership();
        assert_eq!(ownership.assignment("102"), Assignment::AssignedTo(0));
        assert_eq!(ownership.assignment("205"), Assignment::AssignedTo(1));
        assert_eq!(ownership.assignment("999"), Assignment::Unassigned);
        assert_eq!(config.custom_group_for("102").unwrap().name, "IBI");
    }

    #[test]
    fn lint_reports_double_claim_and_empty_group() {
        let mut config = GroupingConfig::from_toml(FULL).unwrap();
        config.custom_groups.push(CustomGroup::new("Vacio", &[]));
        let warnings = config.lint();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("'102'")));
        assert!(warnings.iter().any(|w| w.contains("'Vacio'")));
    }

    #[test]
    fn reject_malformed_toml() {
        let err = GroupingConfig::from_toml("group_by_year = \"yes\"").unwrap_err();
        assert!(err.to_string().contains("config parse error"));
    }

    #[test]
    fn parse_documented_totals() {
        let input = r#"
[totals]
charge = "1000.00"
voluntary = "700.00"
enforced = "100.00"
pending = "200.00"

[[exercises]]
fiscal_year = 2023
charge = "500.00"
voluntary = "450.10"
"#;
        let documented = DocumentedTotals::from_toml(input).unwrap();
        let totals = documented.totals.unwrap();
        assert_eq!(totals.charge, dec!(1000.00));
        assert_eq!(totals.write_off, dec!(0));
        assert_eq!(totals.total(), dec!(800.00));
        assert_eq!(documented.exercises.len(), 1);
        assert_eq!(documented.exercises[0].fiscal_year, 2023);
        assert_eq!(documented.exercises[0].amounts.voluntary, dec!(450.10));
    }
}
