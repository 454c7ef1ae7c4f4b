// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double for `KernelManager`.

use super::{KernelManager, KernelMessage};
use crate::error::ManagerError;
use crate::exit_status::CommandExitStatus;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelCall {
    WaitUntilReady,
    RunUntilComplete(Vec<String>),
    Restart,
    Shutdown,
}

pub struct FakeKernelManager {
    alive: AtomicBool,
    ready: AtomicBool,
    connection_file: PathBuf,
    scripted_output: Mutex<Vec<String>>,
    calls: Mutex<Vec<KernelCall>>,
}

impl FakeKernelManager {
    pub fn new(connection_file: impl Into<PathBuf>) -> Self {
        Self {
            alive: AtomicBool::new(true),
            ready: AtomicBool::new(true),
            connection_file: connection_file.into(),
            scripted_output: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn not_ready(self) -> Self {
        self.ready.store(false, Ordering::SeqCst);
        self
    }

    pub fn push_output(&self, line: impl Into<String>) {
        self.scripted_output.lock().push(line.into());
    }

    pub fn calls(&self) -> Vec<KernelCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl KernelManager for FakeKernelManager {
    async fn wait_until_ready(&self, _timeout: Duration) -> Result<(), ManagerError> {
        self.calls.lock().push(KernelCall::WaitUntilReady);
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ManagerError::TimedOut("fake kernel never ready".to_string()))
        }
    }

    async fn run_until_complete(
        &self,
        commands: Vec<String>,
    ) -> Result<(mpsc::Receiver<KernelMessage>, oneshot::Receiver<CommandExitStatus>), ManagerError> {
        self.calls.lock().push(KernelCall::RunUntilComplete(commands));
        let (tx, rx) = mpsc::channel(64);
        let (exit_tx, exit_rx) = oneshot::channel();
        for line in self.scripted_output.lock().drain(..) {
            tx.send(KernelMessage { data: line }).await.ok();
        }
        let _ = exit_tx.send(CommandExitStatus::Ok);
        Ok((rx, exit_rx))
    }

    async fn restart(&self) -> Result<(), ManagerError> {
        self.calls.lock().push(KernelCall::Restart);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ManagerError> {
        self.calls.lock().push(KernelCall::Shutdown);
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn connection_file(&self) -> &Path {
        &self.connection_file
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
