// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the DAG, builds the backward and forward pipelines, drives the
//! shared task executor, and publishes the event stream.

use crate::dag::Dag;
use crate::fanout::{composite_filter_id_for_combination, FanOutExpander};
use crate::queue_logger::QueueLogger;
use crate::task_executor::{NodeState, TaskExecutor, DEFAULT_MAX_CONCURRENCY};
use dagflow_core::{
    Connection, DagOutcome, Direction, EngineState, Event, ExecutableItem, ItemExecutionFinishState,
    ItemName, Resource, Settings,
};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};

/// Construction inputs for one workflow run: item dictionaries,
/// connections, node-successor adjacency, execution-permit mapping,
/// settings, project directory, and debug flag.
pub struct EngineConfig {
    pub items: HashMap<ItemName, Arc<dyn ExecutableItem>>,
    pub connections: HashMap<(ItemName, ItemName), Connection>,
    pub successors: HashMap<ItemName, Vec<ItemName>>,
    pub permits: HashMap<ItemName, bool>,
    pub priority: HashMap<ItemName, i64>,
    pub settings: Settings,
    pub project_dir: PathBuf,
    pub debug: bool,
    pub max_concurrency: usize,
}

impl EngineConfig {
    pub fn new(project_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            items: HashMap::new(),
            connections: HashMap::new(),
            successors: HashMap::new(),
            permits: HashMap::new(),
            priority: HashMap::new(),
            settings,
            project_dir: project_dir.into(),
            debug: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_item(mut self, item: Arc<dyn ExecutableItem>) -> Self {
        self.items.insert(item.name().clone(), item);
        self
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.successors
            .entry(connection.source.clone())
            .or_default()
            .push(connection.destination.clone());
        self.connections
            .insert((connection.source.clone(), connection.destination.clone()), connection);
        self
    }

    pub fn with_permit(mut self, item: ItemName, permitted: bool) -> Self {
        self.permits.insert(item, permitted);
        self
    }

    pub fn with_priority(mut self, item: ItemName, priority: i64) -> Self {
        self.priority.insert(item, priority);
        self
    }
}

struct PendingPrompt {
    reply: oneshot::Sender<bool>,
}

/// Owns one workflow run: the DAG, the shared task executor, and the
/// published event stream. Cheap to clone via `Arc<Engine>`; `run` spawns
/// the drive loop on the current Tokio runtime and returns immediately.
pub struct Engine {
    config: Arc<EngineConfig>,
    state: SyncMutex<EngineState>,
    events: AsyncMutex<mpsc::UnboundedReceiver<Event>>,
    logger: QueueLogger,
    cancelled: Arc<AtomicBool>,
    prompts: Arc<SyncMutex<HashMap<ItemName, PendingPrompt>>>,
    run_started: AtomicBool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let (logger, events) = QueueLogger::channel();
        Self {
            config: Arc::new(config),
            state: SyncMutex::new(EngineState::Sleeping),
            events: AsyncMutex::new(events),
            logger,
            cancelled: Arc::new(AtomicBool::new(false)),
            prompts: Arc::new(SyncMutex::new(HashMap::new())),
            run_started: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    /// Start execution. Non-blocking: the DAG is validated and the two
    /// sweeps are driven on a spawned task, progress is observed through
    /// `get_event`.
    pub fn run(self: &Arc<Self>) {
        if self.run_started.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.state.lock();
            if !state.can_transition_to(EngineState::Running) {
                return;
            }
            *state = EngineState::Running;
        }
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.drive().await });
    }

    /// Block until the next event is available. After `dag_exec_finished`,
    /// every further call returns that same terminal event.
    pub async fn get_event(&self) -> Event {
        let mut events = self.events.lock().await;
        match events.recv().await {
            Some(event) => event,
            None => Event::DagExecFinished { outcome: self.terminal_outcome() },
        }
    }

    /// Request cooperative termination: in-flight sub-executions' items see
    /// `stop_execution`, outstanding prompts resolve as declined, and the
    /// engine reaches `UserStopped`.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        for (_, pending) in self.prompts.lock().drain() {
            let _ = pending.reply.send(false);
        }
    }

    /// Resolve an outstanding prompt raised on behalf of `item_name`.
    pub fn answer_prompt(&self, item_name: &ItemName, accepted: bool) {
        if let Some(pending) = self.prompts.lock().remove(item_name) {
            let _ = pending.reply.send(accepted);
        }
    }

    /// Publish a `prompt` event and block until `answer_prompt` resolves it,
    /// a `stop()` declines it, or the sender is dropped. Exposed for
    /// execution managers that need an interactive yes/no decision mid
    /// sub-execution (e.g. to resolve duplicates).
    pub async fn emit_prompt(&self, item: &ItemName, filter_id: Option<String>, message: impl Into<String>) -> bool {
        let (tx, rx) = oneshot::channel();
        self.prompts.lock().insert(item.clone(), PendingPrompt { reply: tx });
        self.logger.publish(Event::Prompt { item: item.clone(), filter_id, message: message.into() });
        rx.await.unwrap_or(false)
    }

    fn terminal_outcome(&self) -> DagOutcome {
        match *self.state.lock() {
            EngineState::UserStopped => DagOutcome::UserStopped,
            EngineState::Failed => DagOutcome::Failed,
            _ => DagOutcome::Completed,
        }
    }

    async fn drive(self: Arc<Self>) {
        let nodes: Vec<ItemName> = self.config.items.keys().cloned().collect();
        let dag = match Dag::validate(nodes, self.config.successors.clone()) {
            Ok(dag) => dag,
            Err(error) => {
                tracing::error!(error = %error, "dag validation failed");
                *self.state.lock() = EngineState::Failed;
                self.logger.publish(Event::DagExecFinished { outcome: DagOutcome::Failed });
                return;
            }
        };

        tracing::info!(nodes = dag.nodes().len(), "backward sweep starting");
        let backward_results = self.run_backward_sweep(&dag).await;

        if self.cancelled.load(Ordering::SeqCst) {
            tracing::info!("stopped before the forward sweep");
            *self.state.lock() = EngineState::UserStopped;
            self.logger.publish(Event::DagExecFinished { outcome: DagOutcome::UserStopped });
            return;
        }

        tracing::info!("forward sweep starting");
        let forward_states = self.run_forward_sweep(&dag, backward_results).await;

        let final_state = if self.cancelled.load(Ordering::SeqCst) {
            EngineState::UserStopped
        } else if forward_states.values().any(|state| *state == NodeState::Failed) {
            EngineState::Failed
        } else {
            EngineState::Completed
        };
        tracing::info!(?final_state, "run finished");
        *self.state.lock() = final_state;
        self.logger.publish(Event::DagExecFinished { outcome: self.terminal_outcome() });
    }

    /// Runs the reversed DAG: each node gathers the backward resources its
    /// original successors already stashed, adds its own
    /// `output_resources(BACKWARD)`, and stores the aggregate. Per-node
    /// failures here are non-fatal — a degraded node simply contributes an
    /// empty backward stack.
    async fn run_backward_sweep(&self, dag: &Dag) -> Arc<SyncMutex<HashMap<ItemName, Vec<Resource>>>> {
        let backward_dag = Arc::new(dag.reversed());
        let results: Arc<SyncMutex<HashMap<ItemName, Vec<Resource>>>> = Arc::new(SyncMutex::new(HashMap::new()));
        let executor = TaskExecutor::with_shared_cancellation(self.config.max_concurrency, Arc::clone(&self.cancelled));

        let config = Arc::clone(&self.config);
        let dag_for_closure = Arc::clone(&backward_dag);
        let results_for_closure = Arc::clone(&results);

        executor
            .run(&backward_dag, &self.config.priority, move |node| {
                let config = Arc::clone(&config);
                let dag = Arc::clone(&dag_for_closure);
                let results = Arc::clone(&results_for_closure);
                async move {
                    let Some(item) = config.items.get(&node) else {
                        return NodeState::Skipped;
                    };
                    let mut gathered: Vec<Resource> = {
                        let results = results.lock();
                        dag.predecessors(&node)
                            .iter()
                            .flat_map(|successor| results.get(successor).cloned().unwrap_or_default())
                            .collect()
                    };
                    gathered.extend(item.output_resources(Direction::Backward));
                    results.lock().insert(node.clone(), gathered);
                    NodeState::Done
                }
            })
            .await;

        results
    }

    /// Runs the original DAG forward: each node gathers the forward
    /// resources its predecessors produced, fans them out across active
    /// filter combinations, executes (or excludes, or is skipped), and
    /// stores its forward output for its own successors.
    async fn run_forward_sweep(
        &self,
        dag: &Dag,
        backward_results: Arc<SyncMutex<HashMap<ItemName, Vec<Resource>>>>,
    ) -> HashMap<ItemName, NodeState> {
        let forward_dag = Arc::new(dag.clone());
        let forward_results: Arc<SyncMutex<HashMap<ItemName, Vec<Resource>>>> = Arc::new(SyncMutex::new(HashMap::new()));
        let executor = TaskExecutor::with_shared_cancellation(self.config.max_concurrency, Arc::clone(&self.cancelled));

        let config = Arc::clone(&self.config);
        let logger = self.logger.clone();
        let cancelled = Arc::clone(&self.cancelled);

        let final_states = executor
            .run(&forward_dag, &self.config.priority, move |node| {
                let config = Arc::clone(&config);
                let dag = Arc::clone(&forward_dag);
                let forward_results = Arc::clone(&forward_results);
                let backward_results = Arc::clone(&backward_results);
                let logger = logger.clone();
                let cancelled = Arc::clone(&cancelled);
                async move { run_forward_node(node, config, dag, forward_results, backward_results, logger, cancelled).await }
            })
            .await;

        for (node, node_state) in &final_states {
            if *node_state == NodeState::Skipped {
                self.logger.publish(Event::ExecFinished {
                    item: node.clone(),
                    filter_id: None,
                    finish_state: ItemExecutionFinishState::Skipped,
                });
            }
        }

        final_states
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_forward_node(
    node: ItemName,
    config: Arc<EngineConfig>,
    dag: Arc<Dag>,
    forward_results: Arc<SyncMutex<HashMap<ItemName, Vec<Resource>>>>,
    backward_results: Arc<SyncMutex<HashMap<ItemName, Vec<Resource>>>>,
    logger: QueueLogger,
    cancelled: Arc<AtomicBool>,
) -> NodeState {
    let span = tracing::info_span!("forward_node", item = %node);
    let _guard = span.enter();

    let Some(item) = config.items.get(&node).cloned() else {
        tracing::warn!("item missing from config, skipping");
        return NodeState::Skipped;
    };

    let predecessor_resources = gather_predecessor_resources(&node, &dag, &forward_results);
    let backward_inputs = backward_results.lock().get(&node).cloned().unwrap_or_default();

    let permitted = *config.permits.get(&node).unwrap_or(&true);
    if !permitted {
        tracing::info!("excluded");
        let forward_inputs: Vec<Resource> = predecessor_resources.into_iter().flat_map(|(_, r)| r).collect();
        item.exclude_execution(&forward_inputs, &backward_inputs);
        logger.publish(Event::ExecFinished {
            item: node.clone(),
            filter_id: None,
            finish_state: ItemExecutionFinishState::Excluded,
        });
        forward_results.lock().insert(node.clone(), item.output_resources(Direction::Forward));
        return NodeState::Done;
    }

    let combinations = FanOutExpander::expand(&node, &predecessor_resources, &config.connections);
    tracing::info!(sub_executions = combinations.len(), "executing");

    let mut handles = Vec::with_capacity(combinations.len());
    for combination in combinations {
        let filter_id = composite_filter_id_for_combination(&combination);
        let item = Arc::clone(&item);
        let logger = logger.clone();
        let backward_inputs = backward_inputs.clone();
        let cancelled = Arc::clone(&cancelled);
        let node = node.clone();
        handles.push(tokio::spawn(async move {
            logger.publish(Event::ExecStarted { item: node.clone(), filter_id: filter_id.clone() });
            if cancelled.load(Ordering::SeqCst) {
                item.stop_execution();
            }
            let finish_state = item.execute(&combination, &backward_inputs, &logger, filter_id.as_deref());
            if finish_state.short_circuits_successors() {
                tracing::warn!(item = %node, filter_id = ?filter_id, ?finish_state, "sub-execution did not succeed");
                logger.log(&node, filter_id.as_deref(), format!("sub-execution did not succeed: {finish_state:?}"));
            }
            logger.publish(Event::ExecFinished { item: node.clone(), filter_id, finish_state });
            finish_state
        }));
    }

    let mut finish_states = Vec::with_capacity(handles.len());
    for handle in handles {
        finish_states.push(handle.await.unwrap_or(ItemExecutionFinishState::NeverFinished));
    }

    forward_results.lock().insert(node.clone(), item.output_resources(Direction::Forward));

    if finish_states.iter().any(|state| state.short_circuits_successors()) {
        tracing::warn!("node failed");
        NodeState::Failed
    } else {
        tracing::info!("completed");
        NodeState::Done
    }
}

fn gather_predecessor_resources(
    node: &ItemName,
    dag: &Dag,
    forward_results: &SyncMutex<HashMap<ItemName, Vec<Resource>>>,
) -> Vec<(ItemName, Vec<Resource>)> {
    let results = forward_results.lock();
    dag.predecessors(node)
        .iter()
        .map(|predecessor| (predecessor.clone(), results.get(predecessor).cloned().unwrap_or_default()))
        .collect()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
