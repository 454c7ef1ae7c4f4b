// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directed edge between two items: resource conversion and filter activation.

use crate::id::ItemName;
use crate::resource::{FilterDescriptor, FilterStack, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `label -> filter_type -> {filter_id: online}`.
pub type ActivationMap = BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>;

/// Directed edge carrying resource conversion rules and filter activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub source: ItemName,
    pub destination: ItemName,
    pub source_endpoint: String,
    pub destination_endpoint: String,
    #[serde(default)]
    activations: ActivationMap,
    #[serde(default)]
    pub use_datapackage: bool,
    /// Resources most recently received from the source, indexed by label.
    #[serde(skip)]
    received: BTreeMap<String, Resource>,
    /// `filter_id -> display_name`, populated by `fetch_database_items`.
    #[serde(skip)]
    filter_candidates: BTreeMap<String, BTreeMap<String, String>>,
}

impl Connection {
    pub fn new(
        source: ItemName,
        destination: ItemName,
        source_endpoint: impl Into<String>,
        destination_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            source,
            destination,
            source_endpoint: source_endpoint.into(),
            destination_endpoint: destination_endpoint.into(),
            activations: ActivationMap::new(),
            use_datapackage: false,
            received: BTreeMap::new(),
            filter_candidates: BTreeMap::new(),
        }
    }

    /// Record (and re-index) the set of labelled resources arriving from the
    /// source.
    pub fn receive_resources_from_source(&mut self, resources: Vec<Resource>) {
        self.received = resources.into_iter().map(|r| (r.label.clone(), r)).collect();
    }

    /// Atomic substitution of a previously received resource; labels must
    /// match.
    pub fn replace_resource_from_source(
        &mut self,
        old_label: &str,
        new: Resource,
    ) -> Result<(), crate::error::CoreError> {
        if new.label != old_label {
            return Err(crate::error::CoreError::PackMismatch(old_label.to_string()));
        }
        if !self.received.contains_key(old_label) {
            return Err(crate::error::CoreError::UnboundLabel(old_label.to_string()));
        }
        self.received.insert(old_label.to_string(), new);
        Ok(())
    }

    /// For each database resource currently held, populate
    /// `filter_id -> display_name` candidate maps (scenarios, tools, ...).
    /// Candidates are supplied by the caller since schema introspection is
    /// an external collaborator's responsibility.
    pub fn fetch_database_items(
        &mut self,
        label: &str,
        filter_type: &str,
        candidates: BTreeMap<String, String>,
    ) {
        self.filter_candidates
            .entry(format!("{label}:{filter_type}"))
            .or_default()
            .extend(candidates);
    }

    /// Flip activation flags for `label -> filter_type -> {id: online}`.
    pub fn set_online(&mut self, label: &str, filter_type: &str, flags: BTreeMap<String, bool>) {
        self.activations
            .entry(label.to_string())
            .or_default()
            .entry(filter_type.to_string())
            .or_default()
            .extend(flags);
    }

    /// Any active filter, over any label.
    pub fn has_filters(&self) -> bool {
        self.activations
            .values()
            .flat_map(|by_type| by_type.values())
            .flat_map(|by_id| by_id.values())
            .any(|&online| online)
    }

    /// Forward-only transform: if `use_datapackage` and the resource pack at
    /// this label exists, replace it with a single datapackage file
    /// resource; otherwise pass through unchanged.
    pub fn convert_resources(&self, resources: Vec<Resource>) -> Vec<Resource> {
        if !self.use_datapackage {
            return resources;
        }
        resources
            .into_iter()
            .map(|r| {
                if r.kind.is_pack() {
                    let mut datapackage = Resource::new(
                        r.provider.clone(),
                        ResourceKind::File,
                        format!("{}_datapackage", r.label),
                    );
                    datapackage.url = r.url.clone();
                    datapackage.filter_stack = r.filter_stack.clone();
                    datapackage
                } else {
                    r
                }
            })
            .collect()
    }

    /// Cartesian product over filter types active for `label`: each axis is
    /// the list of active filter descriptors of that type; an axis with no
    /// active filter contributes a single empty slot. An empty product
    /// (no filter types active at all) yields `[]`.
    pub fn filter_stacks(&self, label: &str) -> Vec<FilterStack> {
        let Some(by_type) = self.activations.get(label) else {
            return Vec::new();
        };

        let axes: Vec<Vec<Option<FilterDescriptor>>> = by_type
            .iter()
            .map(|(filter_type, by_id)| {
                let active: Vec<Option<FilterDescriptor>> = by_id
                    .iter()
                    .filter(|(_, &online)| online)
                    .map(|(id, &online)| {
                        Some(FilterDescriptor {
                            filter_type: filter_type.clone(),
                            filter_id: id.clone(),
                            online,
                        })
                    })
                    .collect();
                if active.is_empty() {
                    vec![None]
                } else {
                    active
                }
            })
            .collect();

        if axes.iter().all(|axis| axis == &[None]) {
            return Vec::new();
        }

        let mut stacks: Vec<FilterStack> = vec![Vec::new()];
        for axis in axes {
            let mut next = Vec::with_capacity(stacks.len() * axis.len());
            for existing in &stacks {
                for slot in &axis {
                    let mut candidate = existing.clone();
                    if let Some(descriptor) = slot {
                        candidate.push(descriptor.clone());
                    }
                    next.push(candidate);
                }
            }
            stacks = next;
        }
        stacks
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
