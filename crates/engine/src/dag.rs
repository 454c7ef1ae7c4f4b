// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG adjacency validation and the reversed graph used by the backward sweep.

use dagflow_core::{CoreError, ItemName};
use std::collections::{HashMap, HashSet};

/// A validated, acyclic adjacency: `node -> successors`.
#[derive(Debug, Clone)]
pub struct Dag {
    nodes: Vec<ItemName>,
    successors: HashMap<ItemName, Vec<ItemName>>,
    predecessors: HashMap<ItemName, Vec<ItemName>>,
}

impl Dag {
    /// Validate that `successors` is acyclic by iterated leaf-stripping:
    /// repeatedly remove nodes with no remaining outgoing edges. If nodes
    /// remain once no further node can be stripped, a cycle exists among
    /// them.
    pub fn validate(
        nodes: Vec<ItemName>,
        successors: HashMap<ItemName, Vec<ItemName>>,
    ) -> Result<Self, CoreError> {
        let mut remaining_out_degree: HashMap<ItemName, usize> = nodes
            .iter()
            .map(|n| (n.clone(), successors.get(n).map(Vec::len).unwrap_or(0)))
            .collect();

        // in[n] = predecessors of n among currently-remaining nodes.
        let mut predecessors: HashMap<ItemName, Vec<ItemName>> = HashMap::new();
        for (from, tos) in &successors {
            for to in tos {
                predecessors.entry(to.clone()).or_default().push(from.clone());
            }
        }

        let mut stripped: HashSet<ItemName> = HashSet::new();
        loop {
            let leaves: Vec<ItemName> = remaining_out_degree
                .iter()
                .filter(|(n, &deg)| deg == 0 && !stripped.contains(*n))
                .map(|(n, _)| n.clone())
                .collect();
            if leaves.is_empty() {
                break;
            }
            for leaf in &leaves {
                stripped.insert(leaf.clone());
                for predecessor in predecessors.get(leaf).cloned().unwrap_or_default() {
                    if let Some(deg) = remaining_out_degree.get_mut(&predecessor) {
                        *deg = deg.saturating_sub(1);
                    }
                }
            }
        }

        if stripped.len() != nodes.len() {
            let cyclic: Vec<String> = nodes
                .iter()
                .filter(|n| !stripped.contains(*n))
                .map(|n| n.to_string())
                .collect();
            return Err(CoreError::CycleDetected(cyclic.join(", ")));
        }

        Ok(Self { nodes, successors, predecessors })
    }

    pub fn nodes(&self) -> &[ItemName] {
        &self.nodes
    }

    pub fn successors(&self, node: &ItemName) -> &[ItemName] {
        self.successors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, node: &ItemName) -> &[ItemName] {
        self.predecessors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The reversed graph used to build the backward pipeline: same nodes,
    /// edges flipped.
    pub fn reversed(&self) -> Dag {
        Dag {
            nodes: self.nodes.clone(),
            successors: self.predecessors.clone(),
            predecessors: self.successors.clone(),
        }
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
