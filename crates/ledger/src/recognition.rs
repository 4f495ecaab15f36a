//! Recognition-year splitting for OPAEF-managed concepts.
//!
//! A managed record whose accounting key names a different year than its
//! collection key is recognized in the accounting year. Such records are pulled
//! out of their own year and listed under a `Rec. <year>` node of the year they
//! are recognized in.
//!
//! The split can run before grouping ([`build_recognition_tree`]) or over an
//! already-built tree ([`split_recognition_years`]); both yield the same tree.

use std::collections::BTreeMap;

use crate::aggregate::{build_tree_with, Classified, GroupNode, Grouper, NodeKind, ROOT_LABEL};
use crate::concept::{raw_year_segment, resolve_code, year_segment, ConceptRegistry};
use crate::config::GroupingConfig;
use crate::model::TributeRecord;

/// Concept codes whose collection is managed by OPAEF.
// TODO: move into GroupingConfig once the managed list varies per entity.
pub const MANAGED_CONCEPTS: [&str; 10] = [
    "102", "204", "205", "206", "208", "213", "218", "501", "700", "777",
];

pub fn is_managed(code: &str) -> bool {
    MANAGED_CONCEPTS.contains(&code)
}

/// Accounting year for a managed record whose key years diverge.
///
/// `None` for unmanaged concepts, matching years, or an accounting year segment
/// that is not an integer.
fn divergent_year(record: &TributeRecord, code: &str) -> Option<i32> {
    if !is_managed(code) {
        return None;
    }
    if raw_year_segment(&record.accounting_key) == raw_year_segment(&record.collection_key) {
        return None;
    }
    year_segment(&record.accounting_key)
}

pub fn is_divergent(record: &TributeRecord) -> bool {
    divergent_year(record, &resolve_code(&record.collection_key)).is_some()
}

/// Year a record is recognized in: its accounting year when divergent,
/// otherwise its fiscal year.
pub fn recognition_year(record: &TributeRecord) -> i32 {
    divergent_year(record, &resolve_code(&record.collection_key)).unwrap_or(record.fiscal_year)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionAssignment<'a> {
    pub record: &'a TributeRecord,
    pub year: i32,
    pub divergent: bool,
}

/// Recognition year of every record, in input order.
pub fn assign_recognition_years(records: &[TributeRecord]) -> Vec<RecognitionAssignment<'_>> {
    records
        .iter()
        .map(|record| {
            let divergent = divergent_year(record, &resolve_code(&record.collection_key));
            RecognitionAssignment {
                record,
                year: divergent.unwrap_or(record.fiscal_year),
                divergent: divergent.is_some(),
            }
        })
        .collect()
}

/// Per-year split of records: (recognized in own year, recognized from elsewhere).
type Buckets<T> = BTreeMap<i32, (Vec<T>, Vec<T>)>;

/// Re-bucket by recognition year first, then group.
pub fn build_recognition_tree(records: &[TributeRecord], config: &GroupingConfig) -> GroupNode {
    let registry = ConceptRegistry::observe(&config.concept_names, records);
    build_recognition_tree_with(records, config, &registry)
}

pub fn build_recognition_tree_with(
    records: &[TributeRecord],
    config: &GroupingConfig,
    registry: &ConceptRegistry,
) -> GroupNode {
    if !config.group_by_year {
        return build_tree_with(records, config, registry);
    }

    let grouper = Grouper::new(config, registry);
    let items = grouper.classify(records);

    let mut buckets: Buckets<&Classified<'_>> = BTreeMap::new();
    for item in &items {
        match divergent_year(item.record, &item.code) {
            Some(year) => buckets.entry(year).or_default().1.push(item),
            None => buckets.entry(item.record.fiscal_year).or_default().0.push(item),
        }
    }

    assemble(&grouper, buckets)
}

/// Split an already-grouped tree (built with the same `config`).
///
/// Year nodes keep their non-divergent records; divergent ones move under the
/// `Rec.` node of their accounting year, creating that year node if needed.
/// Year nodes left empty are dropped.
pub fn split_recognition_years(
    tree: &GroupNode,
    config: &GroupingConfig,
    registry: &ConceptRegistry,
) -> GroupNode {
    if !config.group_by_year {
        return tree.clone();
    }

    let mut buckets: Buckets<TributeRecord> = BTreeMap::new();
    for year_node in &tree.children {
        let NodeKind::Year { year } = year_node.kind else {
            continue;
        };
        for record in year_node.all_records() {
            match divergent_year(record, &resolve_code(&record.collection_key)) {
                Some(recognized) => buckets.entry(recognized).or_default().1.push(record.clone()),
                None => buckets.entry(year).or_default().0.push(record.clone()),
            }
        }
    }

    let grouper = Grouper::new(config, registry);
    let classified: BTreeMap<i32, (Vec<Classified<'_>>, Vec<Classified<'_>>)> = buckets
        .iter()
        .map(|(year, (regular, recognized))| {
            (*year, (grouper.classify(regular), grouper.classify(recognized)))
        })
        .collect();

    let refs: Buckets<&Classified<'_>> = classified
        .iter()
        .map(|(year, (regular, recognized))| {
            (*year, (regular.iter().collect(), recognized.iter().collect()))
        })
        .collect();

    assemble(&grouper, refs)
}

fn assemble(grouper: &Grouper<'_>, buckets: Buckets<&Classified<'_>>) -> GroupNode {
    let divergent: usize = buckets.values().map(|(_, recognized)| recognized.len()).sum();
    let years: Vec<GroupNode> = buckets
        .into_iter()
        .map(|(year, (regular, recognized))| grouper.year_node(year, &regular, &recognized))
        .collect();

    tracing::debug!(years = years.len(), divergent, "recognition years assigned");
    GroupNode::branch(NodeKind::Root, ROOT_LABEL, years)
}
