// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiplexes item-scoped log/event/prompt messages onto the engine's
//! single event queue, tagged with a filter id for fan-out correlation.

use dagflow_core::{Event, ItemName};
use tokio::sync::mpsc;

/// One end of the fan-in: cloned per sub-execution so concurrent workers
/// can each push events without contending on a shared `&mut`.
#[derive(Clone)]
pub struct QueueLogger {
    tx: mpsc::UnboundedSender<Event>,
}

impl QueueLogger {
    /// Create a logger paired with the receiver the engine drains in
    /// `get_event`.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Push an event already tagged with its item and filter id.
    ///
    /// Send failures mean the receiver was dropped (engine shut down); they
    /// do not propagate since logging must never break a sub-execution.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::warn!("event queue receiver dropped, discarding event");
        }
    }

    /// Convenience for the common `event_msg` shape items emit for free-form
    /// progress text.
    pub fn log(&self, item: &ItemName, filter_id: Option<&str>, message: impl Into<String>) {
        self.publish(Event::EventMsg {
            item: item.clone(),
            filter_id: filter_id.map(str::to_string),
            message: message.into(),
        });
    }
}

impl dagflow_core::EventSink for QueueLogger {
    fn publish(&self, event: Event) {
        QueueLogger::publish(self, event);
    }
}

#[cfg(test)]
#[path = "queue_logger_tests.rs"]
mod tests;
