// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource fan-out: expand each predecessor's output resources against the
//! connection's active filter stacks, then take the Cartesian product across
//! predecessors to get the set of sub-execution resource combinations for one
//! destination node.

use dagflow_core::{composite_filter_id, Connection, ItemName, Resource};
use std::collections::HashMap;

/// Expands resources flowing into one destination across connections and
/// filter activations. Stateless: all state lives in the connections passed
/// in.
pub struct FanOutExpander;

impl FanOutExpander {
    /// `predecessor_resources` is this destination's immediate predecessors
    /// paired with the resources each one produced (in the sweep direction
    /// currently running). `connections` keys on `(source, destination)`.
    ///
    /// A predecessor with no matching connection entry passes its resources
    /// through unfiltered. A destination with no predecessors at all yields
    /// exactly one combination: an empty resource list, so it still gets one
    /// sub-execution.
    pub fn expand(
        destination: &ItemName,
        predecessor_resources: &[(ItemName, Vec<Resource>)],
        connections: &HashMap<(ItemName, ItemName), Connection>,
    ) -> Vec<Vec<Resource>> {
        let mut per_predecessor: Vec<Vec<Vec<Resource>>> = Vec::with_capacity(predecessor_resources.len());

        for (source, resources) in predecessor_resources {
            let connection = connections.get(&(source.clone(), destination.clone()));
            let converted = match connection {
                Some(conn) => conn.convert_resources(resources.clone()),
                None => resources.clone(),
            };
            per_predecessor.push(predecessor_combinations(&converted, connection));
        }

        per_predecessor.into_iter().fold(vec![Vec::new()], |acc, predecessor_combos| {
            let mut next = Vec::with_capacity(acc.len() * predecessor_combos.len().max(1));
            for combo in &acc {
                for p_combo in &predecessor_combos {
                    let mut merged = combo.clone();
                    merged.extend(p_combo.iter().cloned());
                    next.push(merged);
                }
            }
            next
        })
    }
}

/// Per-resource filter expansion: a resource with no active filter stacks on
/// its label contributes one unfiltered variant, one with N active stacks
/// contributes N filtered variants.
fn expand_resource_variants(resource: &Resource, connection: Option<&Connection>) -> Vec<Resource> {
    let stacks = connection.map(|c| c.filter_stacks(&resource.label)).unwrap_or_default();
    if stacks.is_empty() {
        vec![resource.clone()]
    } else {
        stacks.into_iter().map(|stack| resource.with_expanded_stack(stack)).collect()
    }
}

/// Filter-stack expansion only applies when a predecessor forwards exactly
/// one resource and that resource has one or more active filter stacks —
/// a tuple of any other length passes through unchanged, one combination.
fn predecessor_combinations(resources: &[Resource], connection: Option<&Connection>) -> Vec<Vec<Resource>> {
    match resources {
        [resource] => expand_resource_variants(resource, connection)
            .into_iter()
            .map(|variant| vec![variant])
            .collect(),
        _ => vec![resources.to_vec()],
    }
}

/// The composite filter id tagging a sub-execution's combination of
/// resources, in predecessor order. `None` when nothing in the combination
/// was filtered, meaning this is the single unfiltered sub-execution.
pub fn composite_filter_id_for_combination(combination: &[Resource]) -> Option<String> {
    let ids: Vec<String> = combination
        .iter()
        .filter(|r| !r.filter_stack.is_empty())
        .map(|r| r.filter_id())
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(composite_filter_id(ids.iter().map(String::as_str)))
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
