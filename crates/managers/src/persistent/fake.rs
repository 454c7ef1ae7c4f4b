// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double for `PersistentManager`.

use super::{PersistentManager, StdioMessage};
use crate::error::ManagerError;
use crate::exit_status::CommandExitStatus;
use async_trait::async_trait;
use dagflow_core::StdioChannel;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};

/// One recorded call against a `FakePersistentManager`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistentCall {
    IssueCommand { cmd: String, add_history: bool },
    Restart,
    Interrupt,
    Completions { text: String },
    HistoryItem { index: usize },
}

/// Scripted, in-memory `PersistentManager` for engine/scheduler tests.
pub struct FakePersistentManager {
    alive: AtomicBool,
    /// One scripted response queue per `issue_command` call, consumed in
    /// FIFO order.
    scripted_responses: Mutex<VecDeque<Vec<StdioMessage>>>,
    scripted_failure: Mutex<Option<String>>,
    history: Mutex<Vec<String>>,
    calls: Mutex<Vec<PersistentCall>>,
}

impl FakePersistentManager {
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            scripted_responses: Mutex::new(VecDeque::new()),
            scripted_failure: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the messages the next `issue_command` call should yield.
    pub fn push_response(&self, messages: Vec<StdioMessage>) {
        self.scripted_responses.lock().push_back(messages);
    }

    pub fn push_stdout(&self, line: impl Into<String>) {
        self.push_response(vec![StdioMessage { channel: StdioChannel::Stdout, data: line.into() }]);
    }

    /// Simulate the subprocess dying mid-command: the next `issue_command`
    /// yields a single final stderr message and the manager goes dead.
    pub fn kill_on_next_command(&self, exit_message: impl Into<String>) {
        *self.scripted_failure.lock() = Some(exit_message.into());
    }

    pub fn calls(&self) -> Vec<PersistentCall> {
        self.calls.lock().clone()
    }
}

impl Default for FakePersistentManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistentManager for FakePersistentManager {
    async fn issue_command(
        &self,
        cmd: &str,
        add_history: bool,
    ) -> Result<(mpsc::Receiver<StdioMessage>, oneshot::Receiver<CommandExitStatus>), ManagerError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(ManagerError::Dead("fake persistent manager".to_string()));
        }
        self.calls.lock().push(PersistentCall::IssueCommand {
            cmd: cmd.to_string(),
            add_history,
        });
        if add_history {
            self.history.lock().push(cmd.to_string());
        }

        let (tx, rx) = mpsc::channel(64);
        let (exit_tx, exit_rx) = oneshot::channel();
        if let Some(exit_message) = self.scripted_failure.lock().take() {
            self.alive.store(false, Ordering::SeqCst);
            tx.send(StdioMessage { channel: StdioChannel::Stderr, data: exit_message })
                .await
                .ok();
            let _ = exit_tx.send(CommandExitStatus::Error);
            return Ok((rx, exit_rx));
        }

        let messages = self.scripted_responses.lock().pop_front().unwrap_or_default();
        let stderr_emitted = messages.iter().any(|m| m.channel == StdioChannel::Stderr);
        for message in messages {
            tx.send(message).await.ok();
        }
        let _ = exit_tx.send(CommandExitStatus::combine(true, stderr_emitted));
        Ok((rx, exit_rx))
    }

    async fn restart_persistent(&self) -> Result<(), ManagerError> {
        self.calls.lock().push(PersistentCall::Restart);
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn interrupt_persistent(&self) -> Result<(), ManagerError> {
        self.calls.lock().push(PersistentCall::Interrupt);
        Ok(())
    }

    async fn get_completions(&self, text: &str) -> Result<Vec<String>, ManagerError> {
        self.calls.lock().push(PersistentCall::Completions { text: text.to_string() });
        Ok(Vec::new())
    }

    async fn get_history_item(&self, index: usize) -> Result<String, ManagerError> {
        self.calls.lock().push(PersistentCall::HistoryItem { index });
        if index == 0 {
            return Err(ManagerError::CommandFailed("history_item is one-based".to_string()));
        }
        self.history
            .lock()
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

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
