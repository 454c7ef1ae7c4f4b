//! Behavioral specifications for the DAG workflow engine.
//!
//! Exercises the `Engine` public contract directly against scriptable
//! `NullItem`s, covering the scenarios a black-box CLI spec would otherwise
//! drive through a project-definition file.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use dagflow_core::{
    Connection, DagOutcome, EngineState, Event, ExecutableItem, FilterDescriptor,
    ItemExecutionFinishState, ItemName, NullItem, Resource, ResourceKind, Settings,
};
use dagflow_engine::{Engine, EngineConfig};
use std::collections::BTreeMap;
use std::sync::Arc;

fn name(s: &str) -> ItemName {
    ItemName::new(s)
}

async fn run_to_completion(engine: &Arc<Engine>) -> Event {
    engine.run();
    loop {
        let event = engine.get_event().await;
        if event.is_terminal() {
            return event;
        }
    }
}

#[tokio::test]
async fn linear_chain_runs_start_to_finish() {
    let a = Arc::new(
        NullItem::new("extract").with_forward_outputs(vec![Resource::new(name("extract"), ResourceKind::File, "rows")]),
    );
    let b = Arc::new(
        NullItem::new("transform").with_forward_outputs(vec![Resource::new(name("transform"), ResourceKind::File, "rows")]),
    );
    let c = Arc::new(NullItem::new("load"));

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(a)
        .with_item(b)
        .with_item(Arc::clone(&c) as Arc<dyn ExecutableItem>)
        .with_connection(Connection::new(name("extract"), name("transform"), "out", "in"))
        .with_connection(Connection::new(name("transform"), name("load"), "out", "in"));
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Completed });
    assert_eq!(engine.state(), EngineState::Completed);
}

#[tokio::test]
async fn fan_out_across_two_active_filters_runs_two_sub_executions() {
    let upstream = Arc::new(
        NullItem::new("source").with_forward_outputs(vec![Resource::new(name("source"), ResourceKind::Database, "db")]),
    );
    let downstream = Arc::new(NullItem::new("report"));

    let mut connection = Connection::new(name("source"), name("report"), "out", "in");
    let mut flags = BTreeMap::new();
    flags.insert("base".to_string(), true);
    flags.insert("stretch".to_string(), true);
    connection.set_online("db", "scenario", flags);

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(upstream)
        .with_item(Arc::clone(&downstream) as Arc<dyn ExecutableItem>)
        .with_connection(connection);
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Completed });
}

#[tokio::test]
async fn a_diamond_with_one_failing_branch_still_completes_the_other() {
    let root = Arc::new(
        NullItem::new("root").with_forward_outputs(vec![Resource::new(name("root"), ResourceKind::File, "seed")]),
    );
    let failing = Arc::new(NullItem::new("failing").with_finish_state(ItemExecutionFinishState::Failure));
    let healthy = Arc::new(
        NullItem::new("healthy").with_forward_outputs(vec![Resource::new(name("healthy"), ResourceKind::File, "ok")]),
    );
    let sink = Arc::new(NullItem::new("sink"));

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(root)
        .with_item(failing)
        .with_item(healthy)
        .with_item(sink)
        .with_connection(Connection::new(name("root"), name("failing"), "out", "in"))
        .with_connection(Connection::new(name("root"), name("healthy"), "out", "in"))
        .with_connection(Connection::new(name("failing"), name("sink"), "out", "in"))
        .with_connection(Connection::new(name("healthy"), name("sink"), "out", "in"));
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    // sink is SKIPPED via the failing branch, so the overall run is FAILED;
    // healthy itself still finished successfully before that was known.
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Failed });
}

#[tokio::test]
async fn stop_during_execution_reaches_user_stopped() {
    let a = Arc::new(NullItem::new("a"));
    let config = EngineConfig::new("/tmp/project", Settings::default()).with_item(a);
    let engine = Arc::new(Engine::new(config));

    engine.stop();
    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::UserStopped });
    assert_eq!(engine.state(), EngineState::UserStopped);
}

#[tokio::test]
async fn an_excluded_item_passes_resources_through_without_executing() {
    let gatekeeper = Arc::new(
        NullItem::new("gatekeeper").with_forward_outputs(vec![Resource::new(name("gatekeeper"), ResourceKind::File, "data")]),
    );
    let consumer = Arc::new(NullItem::new("consumer"));

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(Arc::clone(&gatekeeper) as Arc<dyn ExecutableItem>)
        .with_item(consumer)
        .with_connection(Connection::new(name("gatekeeper"), name("consumer"), "out", "in"))
        .with_permit(name("gatekeeper"), false);
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Completed });
    assert_eq!(gatekeeper.excluded_calls().len(), 1);
}

#[tokio::test]
async fn a_cyclic_dag_fails_immediately_without_running_anything() {
    let a = Arc::new(NullItem::new("a"));
    let b = Arc::new(NullItem::new("b"));

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(a)
        .with_item(b)
        .with_connection(Connection::new(name("a"), name("b"), "out", "in"))
        .with_connection(Connection::new(name("b"), name("a"), "out", "in"));
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Failed });
    assert_eq!(engine.state(), EngineState::Failed);
}

#[tokio::test]
async fn a_predecessor_emitting_zero_resources_still_executes_its_successor() {
    let quiet = Arc::new(NullItem::new("quiet"));
    let successor = Arc::new(NullItem::new("successor"));

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(quiet)
        .with_item(Arc::clone(&successor) as Arc<dyn ExecutableItem>)
        .with_connection(Connection::new(name("quiet"), name("successor"), "out", "in"));
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Completed });
}

#[tokio::test]
async fn single_node_with_no_edges_completes() {
    let lonely = Arc::new(NullItem::new("lonely"));
    let config = EngineConfig::new("/tmp/project", Settings::default()).with_item(lonely);
    let engine = Arc::new(Engine::new(config));

    let outcome = run_to_completion(&engine).await;
    assert_eq!(outcome, Event::DagExecFinished { outcome: DagOutcome::Completed });
}

#[tokio::test]
async fn filter_stack_fan_out_tags_events_with_distinct_composite_filter_ids() {
    let source = Arc::new(
        NullItem::new("source").with_forward_outputs(vec![Resource::new(name("source"), ResourceKind::Database, "db")]),
    );
    let sink = Arc::new(NullItem::new("sink"));

    let mut connection = Connection::new(name("source"), name("sink"), "out", "in");
    let mut flags = BTreeMap::new();
    flags.insert("scenario-a".to_string(), true);
    flags.insert("scenario-b".to_string(), true);
    connection.set_online("db", "scenario", flags);

    let config = EngineConfig::new("/tmp/project", Settings::default())
        .with_item(source)
        .with_item(sink)
        .with_connection(connection);
    let engine = Arc::new(Engine::new(config));

    engine.run();
    let mut seen_filter_ids = Vec::new();
    loop {
        let event = engine.get_event().await;
        if let Event::ExecStarted { item, filter_id } = &event {
            if *item == name("sink") {
                if let Some(id) = filter_id {
                    seen_filter_ids.push(id.clone());
                }
            }
        }
        if event.is_terminal() {
            break;
        }
    }
    seen_filter_ids.sort();
    seen_filter_ids.dedup();
    assert_eq!(seen_filter_ids.len(), 2, "expected one composite filter id per sub-execution");
}

#[tokio::test]
async fn a_persistent_command_yields_its_scripted_stdio_until_the_sentinel_fires() {
    use dagflow_core::StdioChannel;
    use dagflow_managers::{FakePersistentManager, PersistentManager};

    let manager = FakePersistentManager::new();
    manager.push_stdout("42");

    let (mut messages, exit_status) = manager.issue_command("1 + 41", true).await.expect("command accepted");
    let message = messages.recv().await.expect("one scripted message");
    assert_eq!(message.channel, StdioChannel::Stdout);
    assert_eq!(message.data, "42");
    assert!(messages.recv().await.is_none(), "no further messages after the sentinel");
    assert!(exit_status.await.expect("exit status resolves").is_ok());
    assert_eq!(manager.get_history_item(1).await.unwrap(), "1 + 41");
}

#[tokio::test]
async fn a_persistent_manager_dying_mid_command_is_reported_and_marked_dead() {
    use dagflow_managers::{FakePersistentManager, PersistentManager};

    let manager = FakePersistentManager::new();
    manager.kill_on_next_command("interpreter exited with code 1");

    let (mut messages, exit_status) = manager.issue_command("boom()", false).await.expect("command accepted");
    let failure = messages.recv().await.expect("one final stderr message");
    assert_eq!(failure.data, "interpreter exited with code 1");
    assert!(!exit_status.await.expect("exit status resolves").is_ok());
    assert!(!manager.is_persistent_alive().await);
}

#[test]
fn filter_id_is_stable_across_equal_stacks() {
    let stack = vec![FilterDescriptor {
        filter_type: "scenario".to_string(),
        filter_id: "s1".to_string(),
        online: true,
    }];
    assert_eq!(dagflow_core::filter_id(&stack), dagflow_core::filter_id(&stack.clone()));
}
