// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `ExecutableItem` external contract and per-execution finish states.

use crate::event::EventSink;
use crate::id::{GroupId, ItemName};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// Direction of a sweep; `output_resources` and execution are parameterised
/// by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Outcome of one item execution (or sub-execution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemExecutionFinishState {
    Success,
    Failure,
    Skipped,
    Excluded,
    Stopped,
    NeverFinished,
}

impl ItemExecutionFinishState {
    /// True for states that should propagate `Skipped` to forward successors.
    pub fn short_circuits_successors(self) -> bool {
        matches!(self, Self::Failure | Self::Stopped)
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NeverFinished)
    }
}

/// Instantiated twice per workflow run (once per sweep direction), destroyed
/// at run end. Implementors are the concrete project items (Tool, Importer,
/// Exporter, ...); those are out of scope here — only the contract is.
///
/// Methods take `&self`: a node's sub-executions run concurrently against
/// one shared item instance (spec §4.1), so any mutable state an
/// implementation needs is its own responsibility to guard.
pub trait ExecutableItem: Send + Sync {
    fn name(&self) -> &ItemName;
    fn group_id(&self) -> &GroupId;

    /// Whether this item is ready to execute given its currently gathered
    /// inputs (e.g. all required upstream resources present).
    fn ready_to_execute(&self) -> bool;

    /// Run the item for one sub-execution's filtered resources. `sink` and
    /// `filter_id` let a manager-backed implementation relay its output
    /// (stdout/stderr, iopub messages, ...) onto the engine's event stream
    /// tagged with this sub-execution's composite filter id, satisfying the
    /// ordering rule that `exec_started` precedes and `exec_finished`
    /// follows every message a sub-execution publishes.
    fn execute(
        &self,
        forward: &[Resource],
        backward: &[Resource],
        sink: &dyn EventSink,
        filter_id: Option<&str>,
    ) -> ItemExecutionFinishState;

    /// Invoked instead of `execute` when the item is EXCLUDED: it may still
    /// forward resources unchanged.
    fn exclude_execution(&self, forward: &[Resource], backward: &[Resource]);

    /// Resources this item produces in the given direction.
    fn output_resources(&self, direction: Direction) -> Vec<Resource>;

    /// Cooperative cancellation signal for an in-flight execution.
    fn stop_execution(&self);
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
