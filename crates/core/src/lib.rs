// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core data model for the DAG execution engine: resources, connections,
//! filter stacks, the `ExecutableItem` contract, engine/item states, and
//! the event vocabulary. No execution logic lives here.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod connection;
pub mod engine_state;
pub mod error;
pub mod event;
pub mod id;
pub mod item;
pub mod resource;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use connection::{ActivationMap, Connection};
pub use engine_state::EngineState;
pub use error::CoreError;
pub use event::{log_standard_output, DagOutcome, Event, EventSink, StdioChannel};
pub use id::{GroupId, IdGen, ItemName, SequentialIdGen, ShortId, UuidIdGen};
pub use item::{Direction, ExecutableItem, ItemExecutionFinishState};
pub use resource::{composite_filter_id, filter_id, FilterDescriptor, FilterStack, Resource, ResourceKind};
pub use settings::Settings;

#[cfg(any(test, feature = "test-support"))]
pub use test_support::NullItem;
