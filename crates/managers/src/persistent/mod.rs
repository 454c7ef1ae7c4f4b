// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running interpreter subprocess driver (Python/Julia REPL-style).

mod process;
mod protocol;

pub use process::ProcessPersistentManager;
pub use protocol::{decode_request, encode_request};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePersistentManager, PersistentCall};

use crate::error::ManagerError;
use crate::exit_status::CommandExitStatus;
use async_trait::async_trait;
use dagflow_core::StdioChannel;
use tokio::sync::{mpsc, oneshot};

/// One line of output harvested from the child's stdout or stderr while a
/// command is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioMessage {
    pub channel: StdioChannel,
    pub data: String,
}

/// `(tuple(argv), group_id)` — the pool key described in spec §6.
pub type PersistentKey = (Vec<String>, dagflow_core::GroupId);

/// Owns a long-running interpreter subprocess; serialises commands and
/// harvests stdio via sentinel synchronisation. At most one command is in
/// flight per manager at a time.
#[async_trait]
pub trait PersistentManager: Send + Sync + 'static {
    /// Issue a command, returning a channel that yields its stdout/stderr
    /// messages as they arrive, plus a one-shot that resolves to the
    /// command's exit status once the channel closes. The channel closes
    /// when the sentinel fires or the process dies. `add_history` also
    /// pushes the command onto the helper's readline-style history.
    async fn issue_command(
        &self,
        cmd: &str,
        add_history: bool,
    ) -> Result<(mpsc::Receiver<StdioMessage>, oneshot::Receiver<CommandExitStatus>), ManagerError>;

    /// Kill the current process and re-spawn; the pool key survives.
    async fn restart_persistent(&self) -> Result<(), ManagerError>;

    /// Send an interrupt signal; never kills. The in-flight command (if
    /// any) terminates with an error.
    async fn interrupt_persistent(&self) -> Result<(), ManagerError>;

    /// Synchronous RPC to the helper module over its loopback socket.
    async fn get_completions(&self, text: &str) -> Result<Vec<String>, ManagerError>;

    /// One-based history lookup from the most recent entry.
    async fn get_history_item(&self, index: usize) -> Result<String, ManagerError>;

    async fn is_persistent_alive(&self) -> bool;
}
