// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource, filter descriptor, and filter stack types.

use crate::id::ItemName;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Kind of a resource flowing along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    File,
    FilePack,
    Database,
    TransientFile,
}

impl ResourceKind {
    /// Pack resources are never equal to a non-pack resource with the same
    /// label, even if every other field matches.
    pub fn is_pack(self) -> bool {
        matches!(self, ResourceKind::FilePack)
    }
}

/// One element of a filter stack: a named filter type with a stable id and
/// an online/offline activation flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub filter_type: String,
    pub filter_id: String,
    pub online: bool,
}

/// Ordered sequence of filter descriptors applied, in order, to a database
/// URL. Two stacks are equal iff their descriptor sequences are equal.
pub type FilterStack = Vec<FilterDescriptor>;

/// Compute the deterministic, stable hash of a filter stack: the same stack
/// always yields the same id, across runs and processes.
pub fn filter_id(stack: &FilterStack) -> String {
    // Canonicalize to JSON before hashing so field order in the descriptor
    // struct can never perturb the digest.
    let canonical = serde_json::to_vec(stack).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    format!("{:x}", hasher.finalize())
}

/// Join per-resource filter ids into one composite id for a fan-out
/// combination, in predecessor order.
pub fn composite_filter_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    ids.into_iter().collect::<Vec<_>>().join(":")
}

/// Immutable descriptor of a file, database URL, or pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub provider: ItemName,
    pub kind: ResourceKind,
    pub label: String,
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub filter_stack: FilterStack,
}

impl Resource {
    pub fn new(provider: ItemName, kind: ResourceKind, label: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            label: label.into(),
            url: None,
            metadata: BTreeMap::new(),
            filter_stack: Vec::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_filter_stack(mut self, stack: FilterStack) -> Self {
        self.filter_stack = stack;
        self
    }

    /// Stable hash of this resource's filter stack.
    pub fn filter_id(&self) -> String {
        filter_id(&self.filter_stack)
    }

    /// Clone this resource, attaching a (possibly different) filter stack
    /// and its derived filter id. Used by the fan-out expansion step.
    pub fn with_expanded_stack(&self, stack: FilterStack) -> Self {
        Self {
            filter_stack: stack,
            ..self.clone()
        }
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        if self.kind.is_pack() != other.kind.is_pack() {
            return false;
        }
        self.provider == other.provider
            && self.kind == other.kind
            && self.label == other.label
            && self.url == other.url
            && self.filter_stack == other.filter_stack
    }
}

impl Eq for Resource {}

impl std::hash::Hash for Resource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.kind.hash(state);
        self.label.hash(state);
        self.url.hash(state);
        self.filter_stack.hash(state);
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
