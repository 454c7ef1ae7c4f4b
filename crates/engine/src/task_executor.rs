// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative worker pool driving one pipeline (backward or forward) over
//! a validated [`Dag`]: priority-ordered admission, a concurrency cap, and
//! skip propagation along edges whose upstream node failed or was stopped.

use crate::dag::Dag;
use dagflow_core::ItemName;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Default maximum number of sub-executions running at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// Per-node lifecycle state tracked by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Waiting,
    Ready,
    Running,
    Done,
    Failed,
    Skipped,
}

impl NodeState {
    /// Whether a node finishing in this state should skip its successors.
    pub fn short_circuits_successors(self) -> bool {
        matches!(self, Self::Failed | Self::Skipped)
    }
}

#[derive(Eq, PartialEq)]
struct ReadyEntry {
    priority: i64,
    seq: Reverse<u64>,
    node: ItemName,
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.priority, &self.seq).cmp(&(other.priority, &other.seq))
    }
}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Drives one pipeline to completion, admitting ready nodes by priority
/// (higher first, ties by insertion order) up to a concurrency cap.
pub struct TaskExecutor {
    semaphore: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
}

impl TaskExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self::with_shared_cancellation(max_concurrency, Arc::new(AtomicBool::new(false)))
    }

    /// Build an executor whose cancellation flag is shared with another
    /// executor (the engine's backward and forward pipelines observe one
    /// `stop()` call between them).
    pub fn with_shared_cancellation(max_concurrency: usize, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            cancelled,
        }
    }

    /// Request cooperative cancellation: no further nodes are admitted, and
    /// unadmitted nodes end up `Skipped` once `run` returns.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run every node of `dag` to completion. `priority` ranks a node
    /// (higher runs first among those simultaneously ready); nodes absent
    /// from the map default to priority 0. `run_node` executes one node and
    /// is responsible for invoking `stop_execution` on its item when
    /// [`TaskExecutor::is_cancelled`] is observed.
    pub async fn run<F, Fut>(
        &self,
        dag: &Dag,
        priority: &HashMap<ItemName, i64>,
        run_node: F,
    ) -> HashMap<ItemName, NodeState>
    where
        F: Fn(ItemName) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = NodeState> + Send + 'static,
    {
        let run_node = Arc::new(run_node);
        let mut state: HashMap<ItemName, NodeState> = HashMap::new();
        let mut remaining_predecessors: HashMap<ItemName, usize> = HashMap::new();
        let mut seq: u64 = 0;
        let mut ready_heap: BinaryHeap<ReadyEntry> = BinaryHeap::new();

        for node in dag.nodes() {
            let predecessor_count = dag.predecessors(node).len();
            remaining_predecessors.insert(node.clone(), predecessor_count);
            if predecessor_count == 0 {
                state.insert(node.clone(), NodeState::Ready);
                seq += 1;
                ready_heap.push(ReadyEntry { priority: *priority.get(node).unwrap_or(&0), seq: Reverse(seq), node: node.clone() });
            } else {
                state.insert(node.clone(), NodeState::Waiting);
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<(ItemName, NodeState)>();
        let mut in_flight = 0usize;

        loop {
            if !self.is_cancelled() {
                while let Some(permit) = Arc::clone(&self.semaphore).try_acquire_owned().ok() {
                    let Some(entry) = ready_heap.pop() else {
                        drop(permit);
                        break;
                    };
                    state.insert(entry.node.clone(), NodeState::Running);
                    let run_node = Arc::clone(&run_node);
                    let tx = tx.clone();
                    let node = entry.node.clone();
                    in_flight += 1;
                    tokio::spawn(async move {
                        let result = run_node(node.clone()).await;
                        drop(permit);
                        let _ = tx.send((node, result));
                    });
                }
            }

            if in_flight == 0 {
                if self.is_cancelled() {
                    mark_unreached_as_skipped(dag, &mut state, &ready_heap);
                }
                if ready_heap.is_empty() || self.is_cancelled() {
                    break;
                }
            }

            let Some((node, result)) = rx.recv().await else {
                break;
            };
            in_flight -= 1;
            state.insert(node.clone(), result);
            if result.short_circuits_successors() {
                cascade_skip(&node, dag, &mut state);
            }

            for successor in dag.successors(&node) {
                if matches!(state.get(successor), Some(NodeState::Skipped)) {
                    continue;
                }
                if let Some(count) = remaining_predecessors.get_mut(successor) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        state.insert(successor.clone(), NodeState::Ready);
                        seq += 1;
                        ready_heap.push(ReadyEntry {
                            priority: *priority.get(successor).unwrap_or(&0),
                            seq: Reverse(seq),
                            node: successor.clone(),
                        });
                    }
                }
            }
        }

        state
    }
}

/// Mark every node reachable from `node` that has not already finished as
/// `Skipped`, breadth-first.
fn cascade_skip(node: &ItemName, dag: &Dag, state: &mut HashMap<ItemName, NodeState>) {
    let mut queue: VecDeque<ItemName> = dag.successors(node).iter().cloned().collect();
    while let Some(current) = queue.pop_front() {
        match state.get(&current) {
            Some(NodeState::Done) | Some(NodeState::Failed) | Some(NodeState::Skipped) | Some(NodeState::Running) => continue,
            _ => {}
        }
        state.insert(current.clone(), NodeState::Skipped);
        queue.extend(dag.successors(&current).iter().cloned());
    }
}

/// Once cancellation has drained in-flight work, anything still sitting in
/// the ready heap or waiting on predecessors never got to run.
fn mark_unreached_as_skipped(dag: &Dag, state: &mut HashMap<ItemName, NodeState>, ready_heap: &BinaryHeap<ReadyEntry>) {
    for entry in ready_heap.iter() {
        state.insert(entry.node.clone(), NodeState::Skipped);
    }
    for node in dag.nodes() {
        if matches!(state.get(node), Some(NodeState::Waiting)) {
            state.insert(node.clone(), NodeState::Skipped);
        }
    }
}

#[cfg(test)]
#[path = "task_executor_tests.rs"]
mod tests;
