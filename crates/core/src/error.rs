// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared across the workspace

use thiserror::Error;

/// Errors raised by the core data model (resource/connection/filter algebra).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cycle detected in DAG: {0}")]
    CycleDetected(String),

    #[error("unknown item: {0}")]
    UnknownItem(String),

    #[error("connection refers to a label that never flows through it: {0}")]
    UnboundLabel(String),

    #[error("resource pack/non-pack mismatch for label {0}")]
    PackMismatch(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
