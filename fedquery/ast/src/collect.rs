//! Small visitors that gather nodes of one kind out of a tree.

use crate::expression::{AggregateSymbol, Reference, ReferenceKind};
use crate::symbol::{ElementSymbol, GroupSymbol};
use crate::visit::{self, Visit, Visitor};

/// Must be driven in post-order: a named reference is seen right after its element.
#[derive(Debug, Default)]
struct ElementCollector {
    elements: Vec<ElementSymbol>,
}

impl Visitor for ElementCollector {
    fn visit_element_symbol(&mut self, node: &ElementSymbol) {
        self.elements.push(node.clone());
    }

    fn visit_reference(&mut self, node: &Reference) {
        if matches!(node.kind, ReferenceKind::Named(_)) {
            self.elements.pop();
        }
    }
}

/// Element symbols of `node`, not descending into nested commands.
pub fn elements<N: Visit + ?Sized>(node: &N) -> Vec<ElementSymbol> {
    let mut collector = ElementCollector::default();
    visit::post_order(node, &mut collector);
    collector.elements
}

/// Element symbols of `node` and every nested command.
pub fn deep_elements<N: Visit + ?Sized>(node: &N) -> Vec<ElementSymbol> {
    let mut collector = ElementCollector::default();
    visit::deep_post_order(node, &mut collector);
    collector.elements
}

#[derive(Debug, Default)]
pub struct ReferenceCollector {
    pub references: Vec<Reference>,
}

impl Visitor for ReferenceCollector {
    fn visit_reference(&mut self, node: &Reference) {
        self.references.push(node.clone());
    }
}

/// Bind parameters and correlated references of `node` and its nested commands.
pub fn references<N: Visit + ?Sized>(node: &N) -> Vec<Reference> {
    let mut collector = ReferenceCollector::default();
    visit::deep_pre_order(node, &mut collector);
    collector.references
}

#[derive(Debug, Default)]
pub struct GroupCollector {
    pub groups: Vec<GroupSymbol>,
}

impl Visitor for GroupCollector {
    fn visit_group_symbol(&mut self, node: &GroupSymbol) {
        if !self.groups.contains(node) {
            self.groups.push(node.clone());
        }
    }
}

/// Distinct group symbols named anywhere in `node`, nested commands included.
pub fn groups<N: Visit + ?Sized>(node: &N) -> Vec<GroupSymbol> {
    let mut collector = GroupCollector::default();
    visit::deep_pre_order(node, &mut collector);
    collector.groups
}

#[derive(Debug, Default)]
struct AggregateFinder {
    found: bool,
}

impl Visitor for AggregateFinder {
    fn should_abort(&self) -> bool {
        self.found
    }

    fn visit_aggregate_symbol(&mut self, _node: &AggregateSymbol) {
        self.found = true;
    }
}

/// Returns `true` if `node` contains an aggregate outside nested commands.
pub fn contains_aggregate<N: Visit + ?Sized>(node: &N) -> bool {
    let mut finder = AggregateFinder::default();
    visit::pre_order(node, &mut finder);
    finder.found
}
