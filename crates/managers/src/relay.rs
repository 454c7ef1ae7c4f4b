// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Converts each execution manager's own output-message type into the
//! matching `Event` variant and publishes it through an `EventSink`. A
//! manager-backed item calls these from within its own `ExecutableItem::
//! execute` (the concrete item implementations are out of scope here; this
//! is the glue they would use) so the scheduler and the execution managers
//! share one event stream rather than being disconnected silos.

use crate::kernel::KernelMessage;
use crate::persistent::StdioMessage;
use crate::process_manager::ProcessMessage;
use dagflow_core::{Event, EventSink, ItemName};
use tokio::sync::mpsc;

/// Relay a `PersistentManager::issue_command` stream onto `sink` as
/// `persistent_execution_msg` events until the channel closes.
pub async fn relay_persistent_output(
    item: &ItemName,
    filter_id: Option<&str>,
    mut messages: mpsc::Receiver<StdioMessage>,
    sink: &dyn EventSink,
) {
    while let Some(message) = messages.recv().await {
        sink.publish(Event::PersistentExecutionMsg {
            item: item.clone(),
            filter_id: filter_id.map(str::to_string),
            channel: message.channel,
            data: message.data,
        });
    }
}

/// Relay a `KernelManager::run_until_complete` stream onto `sink` as
/// `kernel_execution_msg` events until the channel closes.
pub async fn relay_kernel_output(
    item: &ItemName,
    filter_id: Option<&str>,
    mut messages: mpsc::Receiver<KernelMessage>,
    sink: &dyn EventSink,
) {
    while let Some(message) = messages.recv().await {
        sink.publish(Event::KernelExecutionMsg {
            item: item.clone(),
            filter_id: filter_id.map(str::to_string),
            data: message.data,
        });
    }
}

/// Relay a `ProcessExecutionManager::run` stream onto `sink` as
/// `process_msg` events until the channel closes.
pub async fn relay_process_output(
    item: &ItemName,
    filter_id: Option<&str>,
    mut messages: mpsc::Receiver<ProcessMessage>,
    sink: &dyn EventSink,
) {
    while let Some(message) = messages.recv().await {
        sink.publish(Event::ProcessMsg {
            item: item.clone(),
            filter_id: filter_id.map(str::to_string),
            channel: message.channel,
            data: message.data,
        });
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
