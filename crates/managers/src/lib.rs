// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-lived execution managers: persistent REPL driver, Jupyter-style
//! kernel client, and one-shot process runner. Each of the first two is
//! reused across workflow steps via a keyed pool.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod exit_status;
pub mod kernel;
pub mod persistent;
pub mod pool;
pub mod process_manager;
pub mod relay;
pub mod subprocess;

pub use error::ManagerError;
pub use exit_status::CommandExitStatus;
pub use kernel::{
    connection_file_path, find_by_connection_file, CondaKernelSpecs, KernelKey, KernelManager,
    KernelMessage, KernelSpec, ProcessKernelManager, DEFAULT_KERNEL_READY_TIMEOUT,
};
pub use persistent::{PersistentKey, PersistentManager, ProcessPersistentManager, StdioMessage};
pub use pool::KeyedPool;
pub use process_manager::{ProcessExecutionManager, ProcessMessage};
pub use relay::{relay_kernel_output, relay_persistent_output, relay_process_output};

#[cfg(any(test, feature = "test-support"))]
pub use kernel::{FakeKernelManager, KernelCall};
#[cfg(any(test, feature = "test-support"))]
pub use persistent::{FakePersistentManager, PersistentCall};

/// Process-wide pool of persistent managers, keyed by `(argv, group_id)`.
pub type PersistentManagerPool<M> = KeyedPool<PersistentKey, M>;

/// Process-wide pool of kernel managers, keyed by `(kernel_name, group_id)`.
pub type KernelManagerPool<M> = KeyedPool<KernelKey, M>;
