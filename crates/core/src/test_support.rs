// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates, gated behind `test-support`.

use crate::event::EventSink;
use crate::id::{GroupId, ItemName};
use crate::item::{Direction, ExecutableItem, ItemExecutionFinishState};
use crate::resource::Resource;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A scriptable item: returns a fixed finish state and fixed forward/
/// backward output resources. Useful for exercising scheduler and fan-out
/// plumbing without a real item implementation.
pub struct NullItem {
    name: ItemName,
    group_id: GroupId,
    finish_state: ItemExecutionFinishState,
    forward_outputs: Vec<Resource>,
    backward_outputs: Vec<Resource>,
    stopped: AtomicBool,
    excluded_calls: Mutex<Vec<(Vec<Resource>, Vec<Resource>)>>,
}

impl NullItem {
    pub fn new(name: impl Into<String>) -> Self {
        let name = ItemName::new(name.into());
        Self {
            group_id: GroupId::new(name.as_str()),
            name,
            finish_state: ItemExecutionFinishState::Success,
            forward_outputs: Vec::new(),
            backward_outputs: Vec::new(),
            stopped: AtomicBool::new(false),
            excluded_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_finish_state(mut self, state: ItemExecutionFinishState) -> Self {
        self.finish_state = state;
        self
    }

    pub fn with_forward_outputs(mut self, resources: Vec<Resource>) -> Self {
        self.forward_outputs = resources;
        self
    }

    pub fn with_backward_outputs(mut self, resources: Vec<Resource>) -> Self {
        self.backward_outputs = resources;
        self
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Forward/backward resources passed to the most recent
    /// `exclude_execution` call, in call order.
    pub fn excluded_calls(&self) -> Vec<(Vec<Resource>, Vec<Resource>)> {
        self.excluded_calls.lock().clone()
    }
}

impl ExecutableItem for NullItem {
    fn name(&self) -> &ItemName {
        &self.name
    }

    fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    fn ready_to_execute(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    fn execute(
        &self,
        _forward: &[Resource],
        _backward: &[Resource],
        sink: &dyn EventSink,
        filter_id: Option<&str>,
    ) -> ItemExecutionFinishState {
        if self.stopped.load(Ordering::SeqCst) {
            return ItemExecutionFinishState::Stopped;
        }
        crate::event::log_standard_output(sink, &self.name, filter_id, format!("{} executed", self.name));
        self.finish_state
    }

    fn exclude_execution(&self, forward: &[Resource], backward: &[Resource]) {
        self.excluded_calls.lock().push((forward.to_vec(), backward.to_vec()));
    }

    fn output_resources(&self, direction: Direction) -> Vec<Resource> {
        match direction {
            Direction::Forward => self.forward_outputs.clone(),
            Direction::Backward => self.backward_outputs.clone(),
        }
    }

    fn stop_execution(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
