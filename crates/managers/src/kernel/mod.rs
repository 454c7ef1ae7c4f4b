// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jupyter-style kernel client and Conda kernel-spec discovery.

mod conda;
mod process;

pub use conda::{CondaKernelSpecs, KernelSpec};
pub use process::ProcessKernelManager;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeKernelManager, KernelCall};

use crate::error::ManagerError;
use crate::exit_status::CommandExitStatus;
use crate::pool::KeyedPool;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// `(kernel_name, group_id)` — the pool key described in spec §6.
pub type KernelKey = (String, dagflow_core::GroupId);

/// One line of iopub output relayed from the kernel while a command batch
/// runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelMessage {
    pub data: String,
}

/// A Jupyter-style kernel client, reused across workflow steps via a keyed
/// pool. Restart and shutdown are routed through the connection-file path
/// so remote clients can address a kernel without knowing the pool key.
#[async_trait]
pub trait KernelManager: Send + Sync + 'static {
    /// Block until the kernel reports ready on its shell channel, or the
    /// timeout elapses.
    async fn wait_until_ready(&self, timeout: Duration) -> Result<(), ManagerError>;

    /// Block until the kernel reports ready, using [`DEFAULT_KERNEL_READY_TIMEOUT`].
    async fn wait_until_ready_default(&self) -> Result<(), ManagerError> {
        self.wait_until_ready(DEFAULT_KERNEL_READY_TIMEOUT).await
    }

    /// Issue each command in sequence, returning a channel that relays
    /// `iopub` output and a one-shot that resolves to the run's exit status
    /// once that channel closes.
    async fn run_until_complete(
        &self,
        commands: Vec<String>,
    ) -> Result<(mpsc::Receiver<KernelMessage>, tokio::sync::oneshot::Receiver<CommandExitStatus>), ManagerError>;

    async fn restart(&self) -> Result<(), ManagerError>;

    async fn shutdown(&self) -> Result<(), ManagerError>;

    /// Path to the kernel's connection file, used for restart/shutdown
    /// addressing independent of the pool key.
    fn connection_file(&self) -> &Path;

    async fn is_alive(&self) -> bool;
}

/// Default timeout used by `wait_until_ready` when the caller does not
/// override it.
pub const DEFAULT_KERNEL_READY_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolve a kernel's connection file path given a runtime directory and
/// its key, mirroring Jupyter's own `kernel-<id>.json` convention.
pub fn connection_file_path(runtime_dir: &Path, kernel_name: &str, group_id: &str) -> PathBuf {
    runtime_dir.join(format!("kernel-{kernel_name}-{group_id}.json"))
}

/// Find a pooled kernel manager by its connection-file path, letting a
/// remote client address a kernel (restart/shutdown) without knowing the
/// pool key that created it.
pub fn find_by_connection_file<M: KernelManager>(
    pool: &KeyedPool<KernelKey, M>,
    connection_file: &Path,
) -> Option<Arc<M>> {
    pool.find(|manager| manager.connection_file() == connection_file)
}

#[cfg(test)]
mod mod_tests {
    use super::*;
    use crate::kernel::fake::FakeKernelManager;

    #[test]
    fn find_by_connection_file_locates_the_matching_pooled_kernel() {
        let pool: KeyedPool<KernelKey, FakeKernelManager> = KeyedPool::new();
        let key_a = ("python3".to_string(), dagflow_core::GroupId::new("g1"));
        let key_b = ("python3".to_string(), dagflow_core::GroupId::new("g2"));
        pool.get_or_insert_with(key_a, || FakeKernelManager::new("/tmp/kernel-a.json"));
        pool.get_or_insert_with(key_b, || FakeKernelManager::new("/tmp/kernel-b.json"));

        let found = find_by_connection_file(&pool, Path::new("/tmp/kernel-b.json"))
            .expect("connection file should match the second kernel");
        assert_eq!(found.connection_file(), Path::new("/tmp/kernel-b.json"));
        assert!(find_by_connection_file(&pool, Path::new("/tmp/unknown.json")).is_none());
    }
}
