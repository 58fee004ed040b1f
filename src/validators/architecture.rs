//! Cross-plugin dependency cycles.
//!
//! Plugins are installed independently, so a delegation cycle across
//! plugins can never be satisfied in load order. Every back edge found by a
//! depth-first search over the cross-plugin links is reported.

use super::{ValidationContext, Validator};
use crate::discovery::{ComponentKey, CrossPluginLink};
use crate::finding::{Finding, ValidationResult};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Back edges `(from, to)` of the link graph, in deterministic order.
pub fn find_cycles(links: &[CrossPluginLink]) -> Vec<(ComponentKey, ComponentKey)> {
    let mut graph: BTreeMap<&ComponentKey, BTreeSet<&ComponentKey>> = BTreeMap::new();
    for link in links {
        graph.entry(&link.source).or_default().insert(&link.target);
        graph.entry(&link.target).or_default();
    }

    let mut marks: BTreeMap<&ComponentKey, Mark> =
        graph.keys().map(|k| (*k, Mark::Unvisited)).collect();
    let mut back_edges = Vec::new();

    for &start in graph.keys() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // Iterative DFS: each frame holds a node and its remaining successors.
        let mut stack: Vec<(&ComponentKey, Vec<&ComponentKey>)> =
            vec![(start, graph[start].iter().rev().copied().collect())];
        marks.insert(start, Mark::OnStack);

        while let Some((node, successors)) = stack.last_mut() {
            let node = *node;
            match successors.pop() {
                Some(next) => match marks[next] {
                    Mark::OnStack => back_edges.push((node.clone(), next.clone())),
                    Mark::Done => {}
                    Mark::Unvisited => {
                        marks.insert(next, Mark::OnStack);
                        stack.push((next, graph[next].iter().rev().copied().collect()));
                    }
                },
                None => {
                    marks.insert(node, Mark::Done);
                    stack.pop();
                }
            }
        }
    }

    back_edges
}

pub struct ArchitectureValidator;

impl Validator for ArchitectureValidator {
    fn id(&self) -> &'static str {
        "architecture"
    }

    fn name(&self) -> &'static str {
        "Architecture Check"
    }

    fn description(&self) -> &'static str {
        "Circular dependencies between plugin components"
    }

    fn validate(&self, ctx: &ValidationContext) -> ValidationResult {
        let mut result = ValidationResult::new(self.name());
        let discovery = ctx.discovery;

        for (from, to) in find_cycles(&discovery.cross_links) {
            result.error(Finding::new(format!(
                "Circular dependency detected involving {}:{} -> {}:{}",
                from.plugin, from.name, to.plugin, to.name
            )));
        }

        result.note(Finding::new(format!(
            "{} components, {} cross-plugin relationships",
            discovery.components.len(),
            discovery.cross_links.len()
        )));
        result
    }
}
