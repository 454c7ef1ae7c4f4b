// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types observed on the engine's event stream.

use crate::id::ItemName;
use serde::{Deserialize, Serialize};

/// Terminal outcome reported by `dag_exec_finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DagOutcome {
    Completed,
    UserStopped,
    Failed,
}

/// Kind of message multiplexed through `QueueLogger` during a sub-execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdioChannel {
    Stdout,
    Stderr,
}

/// Events that flow on the engine's single event queue.
///
/// Serializes as `{"type": "event:name", ...fields}`. `dag_exec_finished` is
/// terminal: no event follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "exec_started")]
    ExecStarted { item: ItemName, filter_id: Option<String> },

    #[serde(rename = "exec_finished")]
    ExecFinished {
        item: ItemName,
        filter_id: Option<String>,
        finish_state: crate::item::ItemExecutionFinishState,
    },

    /// Generic log/event message tagged for fan-out correlation.
    #[serde(rename = "event_msg")]
    EventMsg {
        item: ItemName,
        filter_id: Option<String>,
        message: String,
    },

    /// Output of a one-shot `ProcessExecutionManager`.
    #[serde(rename = "process_msg")]
    ProcessMsg {
        item: ItemName,
        filter_id: Option<String>,
        channel: StdioChannel,
        data: String,
    },

    /// Output from a standard (non-interactive) execution path.
    #[serde(rename = "standard_execution_msg")]
    StandardExecutionMsg {
        item: ItemName,
        filter_id: Option<String>,
        data: String,
    },

    /// Output relayed from a Jupyter-style kernel's iopub channel.
    #[serde(rename = "kernel_execution_msg")]
    KernelExecutionMsg {
        item: ItemName,
        filter_id: Option<String>,
        data: String,
    },

    /// Stdout/stderr harvested from a `PersistentManager` command.
    #[serde(rename = "persistent_execution_msg")]
    PersistentExecutionMsg {
        item: ItemName,
        filter_id: Option<String>,
        channel: StdioChannel,
        data: String,
    },

    /// An item is asking for a yes/no decision (e.g. to resolve duplicates).
    #[serde(rename = "prompt")]
    Prompt {
        item: ItemName,
        filter_id: Option<String>,
        message: String,
    },

    /// A transient, non-blocking notice (not tied to sub-execution order).
    #[serde(rename = "flash")]
    Flash { message: String },

    /// Terminal event; no further event is produced after this one.
    #[serde(rename = "dag_exec_finished")]
    DagExecFinished { outcome: DagOutcome },
}

/// Sink an `ExecutableItem` publishes progress/output events through during
/// `execute`. `QueueLogger` is the production implementation; tests can
/// stub this with a simple `Vec<Event>` collector.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: Event);
}

/// Publish free-form output on the standard (non-interactive) execution
/// path — the path an item takes when it is not backed by one of the
/// `PersistentManager`/`KernelManager`/`ProcessExecutionManager` execution
/// managers, which each have their own channel-tagged event variant.
pub fn log_standard_output(sink: &dyn EventSink, item: &ItemName, filter_id: Option<&str>, data: impl Into<String>) {
    sink.publish(Event::StandardExecutionMsg {
        item: item.clone(),
        filter_id: filter_id.map(str::to_string),
        data: data.into(),
    });
}

impl Event {
    /// Short string tag, mirroring the `type` discriminant used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ExecStarted { .. } => "exec_started",
            Event::ExecFinished { .. } => "exec_finished",
            Event::EventMsg { .. } => "event_msg",
            Event::ProcessMsg { .. } => "process_msg",
            Event::StandardExecutionMsg { .. } => "standard_execution_msg",
            Event::KernelExecutionMsg { .. } => "kernel_execution_msg",
            Event::PersistentExecutionMsg { .. } => "persistent_execution_msg",
            Event::Prompt { .. } => "prompt",
            Event::Flash { .. } => "flash",
            Event::DagExecFinished { .. } => "dag_exec_finished",
        }
    }

    /// Item this event belongs to, if any (`Flash`/`DagExecFinished` are
    /// engine-scoped, not item-scoped).
    pub fn item(&self) -> Option<&ItemName> {
        match self {
            Event::ExecStarted { item, .. }
            | Event::ExecFinished { item, .. }
            | Event::EventMsg { item, .. }
            | Event::ProcessMsg { item, .. }
            | Event::StandardExecutionMsg { item, .. }
            | Event::KernelExecutionMsg { item, .. }
            | Event::PersistentExecutionMsg { item, .. }
            | Event::Prompt { item, .. } => Some(item),
            Event::Flash { .. } | Event::DagExecFinished { .. } => None,
        }
    }

    /// The composite filter id this event is tagged with, if any.
    pub fn filter_id(&self) -> Option<&str> {
        match self {
            Event::ExecStarted { filter_id, .. }
            | Event::ExecFinished { filter_id, .. }
            | Event::EventMsg { filter_id, .. }
            | Event::ProcessMsg { filter_id, .. }
            | Event::StandardExecutionMsg { filter_id, .. }
            | Event::KernelExecutionMsg { filter_id, .. }
            | Event::PersistentExecutionMsg { filter_id, .. }
            | Event::Prompt { filter_id, .. } => filter_id.as_deref(),
            Event::Flash { .. } | Event::DagExecFinished { .. } => None,
        }
    }

    /// True for the one event type after which the stream is closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::DagExecFinished { .. })
    }

    /// One-line human-readable summary, for structured logging call sites
    /// that want a single field rather than the whole event.
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::ExecStarted { item, filter_id } | Event::ExecFinished { item, filter_id, .. } => {
                match filter_id {
                    Some(id) => format!("{t} item={item} filter={id}"),
                    None => format!("{t} item={item}"),
                }
            }
            Event::EventMsg { item, message, .. } => format!("{t} item={item} msg={message}"),
            Event::ProcessMsg { item, channel, .. } => format!("{t} item={item} channel={channel:?}"),
            Event::StandardExecutionMsg { item, .. } => format!("{t} item={item}"),
            Event::KernelExecutionMsg { item, .. } => format!("{t} item={item}"),
            Event::PersistentExecutionMsg { item, channel, .. } => format!("{t} item={item} channel={channel:?}"),
            Event::Prompt { item, message, .. } => format!("{t} item={item} msg={message}"),
            Event::Flash { message } => format!("{t} msg={message}"),
            Event::DagExecFinished { outcome } => format!("{t} outcome={outcome:?}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
