// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution managers.

use thiserror::Error;

/// Errors raised by persistent/kernel/process managers.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    #[error("manager is dead: {0}")]
    Dead(String),

    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("timed out: {0}")]
    TimedOut(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
