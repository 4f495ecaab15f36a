//! Hierarchical grouping of ledger records.
//!
//! Dimensions nest in a fixed order: year, then custom group, then concept.
//! The year switch wraps whatever [`Layout`] the concept/custom switches select.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::concept::{resolve_code, ConceptRegistry};
use crate::config::{Assignment, GroupingConfig, Ownership};
use crate::model::{Amounts, TributeRecord};

pub const ROOT_LABEL: &str = "Total";
pub const UNGROUPED_LABEL: &str = "Ungrouped";
pub const RECORDS_LABEL: &str = "Records";

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Year { year: i32 },
    CustomGroup { name: String, concept_codes: Vec<String> },
    Concept { code: String },
    Ungrouped,
    /// Managed-concept records recognized in `year` rather than their own.
    Recognition { year: i32 },
    Records,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub label: String,
    pub amounts: Amounts,
    pub record_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GroupNode>,
    /// Populated only on leaves.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<TributeRecord>,
}

impl GroupNode {
    pub(crate) fn branch(kind: NodeKind, label: impl Into<String>, children: Vec<GroupNode>) -> Self {
        let amounts = children.iter().map(|c| &c.amounts).sum();
        let record_count = children.iter().map(|c| c.record_count).sum();
        Self {
            kind,
            label: label.into(),
            amounts,
            record_count,
            children,
            records: Vec::new(),
        }
    }

    /// Leaf records are kept in fiscal-year order, stable within a year.
    pub(crate) fn leaf(kind: NodeKind, label: impl Into<String>, mut records: Vec<TributeRecord>) -> Self {
        records.sort_by_key(|r| r.fiscal_year);
        Self {
            kind,
            label: label.into(),
            amounts: records.iter().map(|r| &r.amounts).sum(),
            record_count: records.len(),
            children: Vec::new(),
            records,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Every record below this node, depth-first.
    pub fn all_records(&self) -> Vec<&TributeRecord> {
        let mut out = Vec::with_capacity(self.record_count);
        self.collect_records(&mut out);
        out
    }

    fn collect_records<'a>(&'a self, out: &mut Vec<&'a TributeRecord>) {
        out.extend(self.records.iter());
        for child in &self.children {
            child.collect_records(out);
        }
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(GroupNode::leaf_count).sum()
        }
    }

    /// First node with `label`, depth-first, including `self`.
    pub fn find(&self, label: &str) -> Option<&GroupNode> {
        if self.label == label {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(label))
    }

    pub fn year(&self) -> Option<i32> {
        match self.kind {
            NodeKind::Year { year } | NodeKind::Recognition { year } => Some(year),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Layout strategy
// ---------------------------------------------------------------------------

/// Shape of a (possibly implicit) year scope, picked from the concept and
/// custom-group switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Records listed directly.
    Flat,
    /// One leaf per concept code, ascending.
    Concepts,
    /// One leaf per custom group in configured order, then an ungrouped leaf.
    CustomGroups,
    /// Custom groups holding concept leaves, then unclaimed concept leaves.
    CustomGroupsOfConcepts,
}

impl Layout {
    pub fn for_config(config: &GroupingConfig) -> Self {
        match (config.group_by_concept, config.custom_grouping_active()) {
            (false, false) => Self::Flat,
            (true, false) => Self::Concepts,
            (false, true) => Self::CustomGroups,
            (true, true) => Self::CustomGroupsOfConcepts,
        }
    }
}

/// Output of a layout over one scope: either leaf records or child nodes.
pub(crate) enum Scope {
    Records(Vec<TributeRecord>),
    Children(Vec<GroupNode>),
}

impl Scope {
    pub(crate) fn into_node(self, kind: NodeKind, label: impl Into<String>) -> GroupNode {
        match self {
            Self::Records(records) => GroupNode::leaf(kind, label, records),
            Self::Children(children) => GroupNode::branch(kind, label, children),
        }
    }
}

/// A record with its concept code and custom-group assignment resolved once.
#[derive(Debug, Clone)]
pub(crate) struct Classified<'r> {
    pub record: &'r TributeRecord,
    pub code: String,
    pub assignment: Assignment,
}

pub(crate) struct Grouper<'a> {
    config: &'a GroupingConfig,
    registry: &'a ConceptRegistry,
    ownership: Ownership,
    layout: Layout,
}

impl<'a> Grouper<'a> {
    pub(crate) fn new(config: &'a GroupingConfig, registry: &'a ConceptRegistry) -> Self {
        Self {
            config,
            registry,
            ownership: config.ownership(),
            layout: Layout::for_config(config),
        }
    }

    pub(crate) fn classify<'r>(&self, records: &'r [TributeRecord]) -> Vec<Classified<'r>> {
        records
            .iter()
            .map(|record| {
                let code = resolve_code(&record.collection_key);
                let assignment = self.ownership.assignment(&code);
                Classified { record, code, assignment }
            })
            .collect()
    }

    pub(crate) fn scope(&self, items: &[&Classified<'_>]) -> Scope {
        match self.layout {
            Layout::Flat => Scope::Records(items.iter().map(|i| i.record.clone()).collect()),
            Layout::Concepts => Scope::Children(
                by_code(items)
                    .into_iter()
                    .map(|(code, members)| self.concept_leaf(code, &members))
                    .collect(),
            ),
            Layout::CustomGroups => Scope::Children(self.custom_group_leaves(items)),
            Layout::CustomGroupsOfConcepts => Scope::Children(self.custom_groups_of_concepts(items)),
        }
    }

    pub(crate) fn year_node(
        &self,
        year: i32,
        regular: &[&Classified<'_>],
        recognized: &[&Classified<'_>],
    ) -> GroupNode {
        let kind = NodeKind::Year { year };
        let label = year.to_string();
        let regular = self.scope(regular);
        if recognized.is_empty() {
            return regular.into_node(kind, label);
        }

        let mut children = match regular {
            Scope::Children(children) => children,
            Scope::Records(records) if records.is_empty() => Vec::new(),
            Scope::Records(records) => vec![GroupNode::leaf(NodeKind::Records, RECORDS_LABEL, records)],
        };
        children.push(
            self.scope(recognized)
                .into_node(NodeKind::Recognition { year }, format!("Rec. {year}")),
        );
        GroupNode::branch(kind, label, children)
    }

    fn concept_leaf(&self, code: &str, members: &[&Classified<'_>]) -> GroupNode {
        let name = self.registry.resolve_name(code);
        let label = if name == code {
            code.to_string()
        } else {
            format!("{name} ({code})")
        };
        GroupNode::leaf(
            NodeKind::Concept { code: code.to_string() },
            label,
            members.iter().map(|i| i.record.clone()).collect(),
        )
    }

    fn custom_group_node_kind(&self, index: usize) -> (NodeKind, String) {
        let group = &self.config.custom_groups[index];
        (
            NodeKind::CustomGroup {
                name: group.name.clone(),
                concept_codes: group.concept_codes.clone(),
            },
            group.name.clone(),
        )
    }

    fn custom_group_leaves(&self, items: &[&Classified<'_>]) -> Vec<GroupNode> {
        let mut nodes = Vec::new();
        for index in 0..self.config.custom_groups.len() {
            let members: Vec<TributeRecord> = items
                .iter()
                .filter(|i| i.assignment == Assignment::AssignedTo(index))
                .map(|i| i.record.clone())
                .collect();
            if members.is_empty() {
                continue;
            }
            let (kind, label) = self.custom_group_node_kind(index);
            nodes.push(GroupNode::leaf(kind, label, members));
        }

        let ungrouped: Vec<TributeRecord> = items
            .iter()
            .filter(|i| i.assignment == Assignment::Unassigned)
            .map(|i| i.record.clone())
            .collect();
        if !ungrouped.is_empty() {
            nodes.push(GroupNode::leaf(NodeKind::Ungrouped, UNGROUPED_LABEL, ungrouped));
        }
        nodes
    }

    fn custom_groups_of_concepts(&self, items: &[&Classified<'_>]) -> Vec<GroupNode> {
        let concepts = by_code(items);
        let mut nodes = Vec::new();

        for index in 0..self.config.custom_groups.len() {
            let children: Vec<GroupNode> = concepts
                .iter()
                .filter(|(_, members)| members[0].assignment == Assignment::AssignedTo(index))
                .map(|(code, members)| self.concept_leaf(code, members))
                .collect();
            if children.is_empty() {
                continue;
            }
            let (kind, label) = self.custom_group_node_kind(index);
            nodes.push(GroupNode::branch(kind, label, children));
        }

        nodes.extend(
            concepts
                .iter()
                .filter(|(_, members)| members[0].assignment == Assignment::Unassigned)
                .map(|(code, members)| self.concept_leaf(code, members)),
        );
        nodes
    }
}

/// Partition by concept code, ascending. Every partition is non-empty.
fn by_code<'i, 'r>(items: &[&'i Classified<'r>]) -> BTreeMap<&'i str, Vec<&'i Classified<'r>>> {
    let mut groups: BTreeMap<&str, Vec<&Classified<'r>>> = BTreeMap::new();
    for &item in items {
        groups.entry(item.code.as_str()).or_default().push(item);
    }
    groups
}

fn by_year<'i, 'r>(items: &[&'i Classified<'r>]) -> BTreeMap<i32, Vec<&'i Classified<'r>>> {
    let mut groups: BTreeMap<i32, Vec<&Classified<'r>>> = BTreeMap::new();
    for &item in items {
        groups.entry(item.record.fiscal_year).or_default().push(item);
    }
    groups
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Build the grouping tree, registering concept names from `records` first.
pub fn build_tree(records: &[TributeRecord], config: &GroupingConfig) -> GroupNode {
    let registry = ConceptRegistry::observe(&config.concept_names, records);
    build_tree_with(records, config, &registry)
}

pub fn build_tree_with(
    records: &[TributeRecord],
    config: &GroupingConfig,
    registry: &ConceptRegistry,
) -> GroupNode {
    let grouper = Grouper::new(config, registry);
    let items = grouper.classify(records);
    let refs: Vec<&Classified<'_>> = items.iter().collect();

    let root = if config.group_by_year {
        let years = by_year(&refs)
            .into_iter()
            .map(|(year, members)| grouper.year_node(year, &members, &[]))
            .collect();
        GroupNode::branch(NodeKind::Root, ROOT_LABEL, years)
    } else {
        grouper.scope(&refs).into_node(NodeKind::Root, ROOT_LABEL)
    };

    tracing::debug!(
        records = root.record_count,
        leaves = root.leaf_count(),
        layout = ?grouper.layout,
        by_year = config.group_by_year,
        "grouping tree built"
    );
    root
}
