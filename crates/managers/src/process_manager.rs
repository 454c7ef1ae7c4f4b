// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot subprocess execution manager.

use crate::error::ManagerError;
use crate::subprocess::PROCESS_KILL_GRACE_PERIOD;
use dagflow_core::StdioChannel;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::warn;

/// One message harvested from the one-shot process's stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMessage {
    pub channel: StdioChannel,
    pub data: String,
}

/// Owns pipes for a single subprocess invocation, drains them, waits for
/// exit, and returns the exit code. On `stop`: attempts polite termination
/// first, escalating to a kill after a grace period.
pub struct ProcessExecutionManager {
    child: Child,
}

impl ProcessExecutionManager {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, ManagerError> {
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ManagerError::SpawnFailed(e.to_string()))?;
        Ok(Self { child })
    }

    /// Drain stdout/stderr into a channel, then wait for exit.
    pub async fn run(mut self) -> Result<(mpsc::Receiver<ProcessMessage>, i32), ManagerError> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let (tx, rx) = mpsc::channel(256);

        if let Some(stdout) = stdout {
            let tx = tx.clone();
            tokio::spawn(drain(stdout, StdioChannel::Stdout, tx));
        }
        if let Some(stderr) = stderr {
            tokio::spawn(drain(stderr, StdioChannel::Stderr, tx));
        }

        let status = self.child.wait().await.map_err(ManagerError::Io)?;
        Ok((rx, status.code().unwrap_or(-1)))
    }

    /// Cooperative stop: SIGTERM first, giving the child a grace period to
    /// exit on its own, then SIGKILL if it hasn't.
    pub async fn stop(&mut self) -> Result<(), ManagerError> {
        match self.child.id() {
            Some(pid) => {
                if let Err(e) = send_sigterm(pid).await {
                    warn!(error = %e, "polite termination failed, escalating immediately");
                    return self.child.kill().await.map_err(ManagerError::Io);
                }
            }
            None => return Ok(()),
        }
        match timeout(PROCESS_KILL_GRACE_PERIOD, self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => self.child.kill().await.map_err(ManagerError::Io),
        }
    }
}

/// Send SIGTERM, giving the process a chance to exit on its own. Shells out
/// to the platform `kill` utility rather than raw FFI, keeping this crate
/// free of `unsafe` code.
#[cfg(unix)]
async fn send_sigterm(pid: u32) -> Result<(), ManagerError> {
    let output = Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .output()
        .await
        .map_err(ManagerError::Io)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(ManagerError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
    }
}

#[cfg(not(unix))]
async fn send_sigterm(_pid: u32) -> Result<(), ManagerError> {
    Err(ManagerError::CommandFailed("polite termination is unsupported on this platform".to_string()))
}

async fn drain(
    reader: impl tokio::io::AsyncRead + Unpin,
    channel: StdioChannel,
    tx: mpsc::Sender<ProcessMessage>,
) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(data)) => {
                if tx.send(ProcessMessage { channel: channel.clone(), data }).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "process stdio drain failed");
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "process_manager_tests.rs"]
mod tests;
