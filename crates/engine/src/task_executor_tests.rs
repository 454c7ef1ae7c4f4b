use super::*;
use crate::dag::Dag;
use dagflow_core::ItemName;
use parking_lot::Mutex;
use std::sync::Arc;

fn name(s: &str) -> ItemName {
    ItemName::new(s)
}

fn linear_dag() -> Dag {
    let nodes = vec![name("a"), name("b"), name("c")];
    let mut successors = HashMap::new();
    successors.insert(name("a"), vec![name("b")]);
    successors.insert(name("b"), vec![name("c")]);
    Dag::validate(nodes, successors).expect("acyclic")
}

#[tokio::test]
async fn runs_every_node_to_done_on_success() {
    let dag = linear_dag();
    let executor = TaskExecutor::new(DEFAULT_MAX_CONCURRENCY);
    let order: Arc<Mutex<Vec<ItemName>>> = Arc::new(Mutex::new(Vec::new()));
    let order_for_closure = Arc::clone(&order);

    let result = executor
        .run(&dag, &HashMap::new(), move |node| {
            let order = Arc::clone(&order_for_closure);
            async move {
                order.lock().push(node);
                NodeState::Done
            }
        })
        .await;

    assert_eq!(result[&name("a")], NodeState::Done);
    assert_eq!(result[&name("b")], NodeState::Done);
    assert_eq!(result[&name("c")], NodeState::Done);

    let ran = order.lock().clone();
    assert_eq!(ran[0], name("a"));
    assert_eq!(ran[1], name("b"));
    assert_eq!(ran[2], name("c"));
}

#[tokio::test]
async fn a_failure_skips_its_successors() {
    let dag = linear_dag();
    let executor = TaskExecutor::new(DEFAULT_MAX_CONCURRENCY);

    let result = executor
        .run(&dag, &HashMap::new(), |node| async move {
            if node == name("b") {
                NodeState::Failed
            } else {
                NodeState::Done
            }
        })
        .await;

    assert_eq!(result[&name("a")], NodeState::Done);
    assert_eq!(result[&name("b")], NodeState::Failed);
    assert_eq!(result[&name("c")], NodeState::Skipped);
}

#[tokio::test]
async fn a_diamond_skips_only_past_the_failing_branch() {
    let nodes = vec![name("a"), name("b"), name("c"), name("d")];
    let mut successors = HashMap::new();
    successors.insert(name("a"), vec![name("b"), name("c")]);
    successors.insert(name("b"), vec![name("d")]);
    successors.insert(name("c"), vec![name("d")]);
    let dag = Dag::validate(nodes, successors).expect("acyclic");

    let executor = TaskExecutor::new(DEFAULT_MAX_CONCURRENCY);
    let result = executor
        .run(&dag, &HashMap::new(), |node| async move {
            if node == name("b") {
                NodeState::Failed
            } else {
                NodeState::Done
            }
        })
        .await;

    assert_eq!(result[&name("c")], NodeState::Done);
    assert_eq!(result[&name("d")], NodeState::Skipped);
}

#[tokio::test]
async fn priority_runs_higher_tagged_ready_nodes_first() {
    let nodes = vec![name("low"), name("high"), name("root")];
    let mut successors = HashMap::new();
    successors.insert(name("root"), vec![name("low"), name("high")]);
    let dag = Dag::validate(nodes, successors).expect("acyclic");

    let mut priority = HashMap::new();
    priority.insert(name("high"), 10);

    let order: Arc<Mutex<Vec<ItemName>>> = Arc::new(Mutex::new(Vec::new()));
    let order_for_closure = Arc::clone(&order);
    let executor = TaskExecutor::new(1);

    executor
        .run(&dag, &priority, move |node| {
            let order = Arc::clone(&order_for_closure);
            async move {
                order.lock().push(node);
                NodeState::Done
            }
        })
        .await;

    let ran = order.lock().clone();
    assert_eq!(ran[0], name("root"));
    assert_eq!(ran[1], name("high"));
    assert_eq!(ran[2], name("low"));
}

#[tokio::test]
async fn single_node_with_no_edges_runs_once() {
    let dag = Dag::validate(vec![name("lonely")], HashMap::new()).expect("acyclic");
    let executor = TaskExecutor::new(DEFAULT_MAX_CONCURRENCY);
    let result = executor.run(&dag, &HashMap::new(), |_| async { NodeState::Done }).await;
    assert_eq!(result[&name("lonely")], NodeState::Done);
}
