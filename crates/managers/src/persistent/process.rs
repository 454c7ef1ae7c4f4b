// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess-backed `PersistentManager`.

use super::protocol::{self, encode_request};
use super::{PersistentManager, StdioMessage};
use crate::error::ManagerError;
use crate::exit_status::CommandExitStatus;
use async_trait::async_trait;
use dagflow_core::StdioChannel;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex as AsyncMutex};
use tracing::warn;

/// Known marker line the bootstrap command makes the helper module print
/// once its internal RPC server is listening.
const HELPER_PORT_MARKER: &str = "OJ_HELPER_PORT:";

struct Inner {
    child: Child,
    stdin: ChildStdin,
    helper_port: Option<u16>,
}

/// A long-running interpreter subprocess driver.
///
/// At most one command may be in flight at a time; `command_lock` enforces
/// that and is held for the duration of `issue_command`.
pub struct ProcessPersistentManager {
    argv: Vec<String>,
    bootstrap: String,
    inner: AsyncMutex<Option<Inner>>,
    command_lock: AsyncMutex<()>,
    stdio_tx: broadcast::Sender<StdioMessage>,
    alive: Arc<AtomicBool>,
    history: Mutex<Vec<String>>,
}

impl ProcessPersistentManager {
    /// Spawn the interpreter and its bootstrap command. `bootstrap` is the
    /// language-specific snippet that imports the helper module and starts
    /// its RPC server; it must print `OJ_HELPER_PORT:<port>` once ready.
    pub async fn spawn(argv: Vec<String>, bootstrap: &str) -> Result<Self, ManagerError> {
        let (stdio_tx, _) = broadcast::channel(1024);
        let alive = Arc::new(AtomicBool::new(true));
        let inner = spawn_inner(&argv, bootstrap, &stdio_tx, alive.clone()).await?;

        Ok(Self {
            argv,
            bootstrap: bootstrap.to_string(),
            inner: AsyncMutex::new(Some(inner)),
            command_lock: AsyncMutex::new(()),
            stdio_tx,
            alive,
            history: Mutex::new(Vec::new()),
        })
    }

    async fn write_stdin(&self, line: &str) -> Result<(), ManagerError> {
        let mut guard = self.inner.lock().await;
        let inner = guard.as_mut().ok_or_else(|| ManagerError::Dead(self.argv.join(" ")))?;
        inner
            .stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(ManagerError::Io)
    }
}

/// Spawn the interpreter child and its bootstrap command, wiring its stdout
/// and stderr readers into `stdio_tx`. Shared by `spawn` (fresh channel) and
/// `restart_persistent` (the manager's existing channel, so subscribers
/// created before the restart keep receiving output from the new child).
/// `alive` is flipped to false by either reader once the child's stdio
/// closes, so an unexpected exit is observed even with no command in flight.
async fn spawn_inner(
    argv: &[String],
    bootstrap: &str,
    stdio_tx: &broadcast::Sender<StdioMessage>,
    alive: Arc<AtomicBool>,
) -> Result<Inner, ManagerError> {
    let (program, args) =
        argv.split_first().ok_or_else(|| ManagerError::SpawnFailed("empty argv".to_string()))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ManagerError::SpawnFailed(e.to_string()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ManagerError::SpawnFailed("child did not inherit a stdout pipe".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ManagerError::SpawnFailed("child did not inherit a stderr pipe".to_string()))?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ManagerError::SpawnFailed("child did not inherit a stdin pipe".to_string()))?;

    let (port_tx, port_rx) = oneshot::channel();
    spawn_stdout_reader(stdout, stdio_tx.clone(), port_tx, alive.clone());
    spawn_stderr_reader(stderr, stdio_tx.clone(), alive);

    stdin.write_all(format!("{bootstrap}\n").as_bytes()).await.map_err(ManagerError::Io)?;

    let helper_port = port_rx.await.ok();

    Ok(Inner { child, stdin, helper_port })
}

/// The command the bootstrap command's helper module is told to run: open a
/// loopback TCP connection to `port` and send `"ok"` or `"error"` depending
/// on whether the preceding user command raised. This is a request for the
/// embedded helper to act; the concrete language snippet is out of scope
/// here (spec §6 specifies the wire protocol only).
pub fn sentinel_probe_command(port: u16) -> String {
    encode_request("ping", &[&port.to_string()])
}

fn spawn_stdout_reader(
    stdout: tokio::process::ChildStdout,
    tx: broadcast::Sender<StdioMessage>,
    port_tx: oneshot::Sender<u16>,
    alive: Arc<AtomicBool>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        let mut port_tx = Some(port_tx);
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(rest) = line.strip_prefix(HELPER_PORT_MARKER) {
                        if let (Some(sender), Ok(port)) = (port_tx.take(), rest.trim().parse()) {
                            let _ = sender.send(port);
                        }
                        continue;
                    }
                    let _ = tx.send(StdioMessage { channel: StdioChannel::Stdout, data: line });
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stdout reader failed");
                    break;
                }
            }
        }
        alive.store(false, Ordering::SeqCst);
    });
}

fn spawn_stderr_reader(
    stderr: tokio::process::ChildStderr,
    tx: broadcast::Sender<StdioMessage>,
    alive: Arc<AtomicBool>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let _ = tx.send(StdioMessage { channel: StdioChannel::Stderr, data: line });
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stderr reader failed");
                    break;
                }
            }
        }
        alive.store(false, Ordering::SeqCst);
    });
}

#[async_trait]
impl PersistentManager for ProcessPersistentManager {
    async fn issue_command(
        &self,
        cmd: &str,
        add_history: bool,
    ) -> Result<(mpsc::Receiver<StdioMessage>, oneshot::Receiver<CommandExitStatus>), ManagerError> {
        if !self.is_persistent_alive().await {
            return Err(ManagerError::Dead(self.argv.join(" ")));
        }
        let _permit = self.command_lock.lock().await;

        let listener = TcpListener::bind(("127.0.0.1", 0)).await.map_err(ManagerError::Io)?;
        let port = listener.local_addr().map_err(ManagerError::Io)?.port();
        let mut stdio_rx = self.stdio_tx.subscribe();

        self.write_stdin(cmd).await?;
        if add_history {
            self.history.lock().push(cmd.to_string());
        }
        self.write_stdin(&sentinel_probe_command(port)).await?;

        let (tx, rx) = mpsc::channel(256);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (stop_tx, mut stop_rx) = oneshot::channel::<bool>();

        tokio::spawn(async move {
            let mut stderr_emitted = false;
            loop {
                tokio::select! {
                    biased;
                    sentinel_ok = &mut stop_rx => {
                        let _ = exit_tx.send(CommandExitStatus::combine(
                            sentinel_ok.unwrap_or(false),
                            stderr_emitted,
                        ));
                        break;
                    }
                    received = stdio_rx.recv() => match received {
                        Ok(message) => {
                            stderr_emitted |= message.channel == StdioChannel::Stderr;
                            if tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    },
                }
            }
        });

        tokio::spawn(async move {
            let sentinel_ok = match listener.accept().await {
                Ok((socket, _)) => {
                    let mut buf = [0u8; 16];
                    let mut reader = socket;
                    match tokio::io::AsyncReadExt::read(&mut reader, &mut buf).await {
                        Ok(n) => &buf[..n] == protocol::SENTINEL_OK.as_bytes(),
                        Err(_) => false,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "sentinel listener failed");
                    false
                }
            };
            let _ = stop_tx.send(sentinel_ok);
        });

        Ok((rx, exit_rx))
    }

    async fn restart_persistent(&self) -> Result<(), ManagerError> {
        let mut guard = self.inner.lock().await;
        if let Some(mut inner) = guard.take() {
            let _ = inner.child.kill().await;
        }
        self.alive.store(false, Ordering::SeqCst);
        let inner = spawn_inner(&self.argv, &self.bootstrap, &self.stdio_tx, self.alive.clone()).await?;
        *guard = Some(inner);
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn interrupt_persistent(&self) -> Result<(), ManagerError> {
        let guard = self.inner.lock().await;
        let inner = guard.as_ref().ok_or_else(|| ManagerError::Dead(self.argv.join(" ")))?;
        let pid = inner
            .child
            .id()
            .ok_or_else(|| ManagerError::CommandFailed("child has already exited".to_string()))?;
        send_sigint(pid).await
    }

    async fn get_completions(&self, text: &str) -> Result<Vec<String>, ManagerError> {
        let guard = self.inner.lock().await;
        let inner = guard.as_ref().ok_or_else(|| ManagerError::Dead(self.argv.join(" ")))?;
        let port = inner
            .helper_port
            .ok_or_else(|| ManagerError::CommandFailed("helper RPC server not ready".to_string()))?;
        helper_rpc(port, protocol::REQUEST_COMPLETIONS, &[text])
            .await
            .map(|line| line.split(protocol::PRIVATE_USE_ONE).map(str::to_string).collect())
    }

    async fn get_history_item(&self, index: usize) -> Result<String, ManagerError> {
        let history = self.history.lock();
        if index == 0 {
            return Err(ManagerError::CommandFailed("history_item is one-based".to_string()));
        }
        history
            .iter()
            .rev()
            .nth(index - 1)
            .cloned()
            .ok_or_else(|| ManagerError::CommandFailed(format!("no history item at {index}")))
    }

    async fn is_persistent_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

async fn helper_rpc(port: u16, request: &str, args: &[&str]) -> Result<String, ManagerError> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.map_err(ManagerError::Io)?;
    let line = encode_request(request, args);
    stream.write_all(line.as_bytes()).await.map_err(ManagerError::Io)?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.map_err(ManagerError::Io)?;
    String::from_utf8(buf)
        .map_err(|e| ManagerError::CommandFailed(e.to_string()))
        .map(|s| s.trim_end_matches('\n').to_string())
}

/// Send SIGINT, never SIGKILL: the in-flight command terminates with an
/// error but the interpreter process itself survives. Shells out to the
/// platform `kill` utility rather than raw FFI, keeping this crate free of
/// `unsafe` code.
#[cfg(unix)]
async fn send_sigint(pid: u32) -> Result<(), ManagerError> {
    let output = Command::new("kill")
        .arg("-INT")
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
async fn send_sigint(_pid: u32) -> Result<(), ManagerError> {
    Err(ManagerError::CommandFailed("interrupt is unsupported on this platform".to_string()))
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
