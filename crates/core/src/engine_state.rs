// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level run state of the engine.

use serde::{Deserialize, Serialize};

/// One of SLEEPING, RUNNING, USER_STOPPED, FAILED, COMPLETED.
///
/// SLEEPING -> RUNNING on `run()`; RUNNING -> one of the three terminal
/// states. A terminal state is sticky: once reached it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Sleeping,
    Running,
    UserStopped,
    Failed,
    Completed,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::UserStopped | Self::Failed | Self::Completed)
    }

    /// Whether `next` is a legal transition from `self`.
    pub fn can_transition_to(self, next: EngineState) -> bool {
        match self {
            Self::Sleeping => next == Self::Running,
            Self::Running => next.is_terminal(),
            terminal => terminal == next,
        }
    }
}

#[cfg(test)]
#[path = "engine_state_tests.rs"]
mod tests;
