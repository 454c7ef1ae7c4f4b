// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess-backed `KernelManager`.

use super::{KernelManager, KernelMessage};
use crate::error::ManagerError;
use crate::exit_status::CommandExitStatus;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tracing::warn;

/// Drives a kernel launched via its `argv` (e.g. an `ipykernel_launcher`
/// invocation), relaying its iopub-equivalent stdout as `KernelMessage`s.
pub struct ProcessKernelManager {
    argv: Vec<String>,
    connection_file: PathBuf,
    child: AsyncMutex<Option<Child>>,
    alive: AtomicBool,
}

/// Launch the kernel child, expanding `{connection_file}` in its argv.
/// Shared by `spawn` and `restart`.
async fn spawn_child(argv: &[String], connection_file: &Path) -> Result<Child, ManagerError> {
    let (program, args) =
        argv.split_first().ok_or_else(|| ManagerError::SpawnFailed("empty argv".to_string()))?;
    let expanded: Vec<String> = args
        .iter()
        .map(|a| a.replace("{connection_file}", &connection_file.to_string_lossy()))
        .collect();

    Command::new(program)
        .args(&expanded)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ManagerError::SpawnFailed(e.to_string()))
}

/// Heuristic error signal for the stub stdout-as-iopub channel: a real
/// kernel reports failure on its iopub status channel, which this driver
/// does not have, so a traceback-shaped line is treated as an error.
fn line_signals_error(line: &str) -> bool {
    line.starts_with("ERROR") || line.contains("Traceback")
}

impl ProcessKernelManager {
    pub async fn spawn(argv: Vec<String>, connection_file: PathBuf) -> Result<Self, ManagerError> {
        let child = spawn_child(&argv, &connection_file).await?;

        Ok(Self {
            argv,
            connection_file,
            child: AsyncMutex::new(Some(child)),
            alive: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl KernelManager for ProcessKernelManager {
    async fn wait_until_ready(&self, timeout: Duration) -> Result<(), ManagerError> {
        // Readiness is signalled by the connection file becoming available
        // on disk; the kernel process writes it once its channels are
        // bound.
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.connection_file.exists() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Err(ManagerError::TimedOut(format!(
            "kernel {:?} did not report ready within {:?}",
            self.argv, timeout
        )))
    }

    async fn run_until_complete(
        &self,
        commands: Vec<String>,
    ) -> Result<(mpsc::Receiver<KernelMessage>, oneshot::Receiver<CommandExitStatus>), ManagerError> {
        if !self.is_alive().await {
            return Err(ManagerError::Dead(self.argv.join(" ")));
        }
        let mut guard = self.child.lock().await;
        let child = guard.as_mut().ok_or_else(|| ManagerError::Dead(self.argv.join(" ")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ManagerError::CommandFailed("stdout already taken".to_string()))?;

        let (tx, rx) = mpsc::channel(256);
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut saw_error = false;
            for command in commands {
                if tx.send(KernelMessage { data: format!("executing: {command}") }).await.is_err() {
                    return;
                }
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        saw_error |= line_signals_error(&line);
                        if tx.send(KernelMessage { data: line }).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "kernel stdout reader failed");
                        saw_error = true;
                        break;
                    }
                }
            }
            let _ = exit_tx.send(CommandExitStatus::combine(!saw_error, false));
        });
        Ok((rx, exit_rx))
    }

    async fn restart(&self) -> Result<(), ManagerError> {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.kill().await;
        }
        self.alive.store(false, Ordering::SeqCst);
        let child = spawn_child(&self.argv, &self.connection_file).await?;
        *guard = Some(child);
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ManagerError> {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.kill().await;
        }
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
#[path = "process_tests.rs"]
mod tests;
