use super::*;

#[tokio::test]
async fn run_drains_stdout_and_returns_exit_code() {
    let manager = ProcessExecutionManager::spawn("printf", &["hello\n".to_string()])
        .expect("spawn should succeed");
    let (mut rx, code) = manager.run().await.expect("runs to completion");
    assert_eq!(code, 0);
    let message = rx.recv().await.expect("at least one line of output");
    assert_eq!(message.channel, StdioChannel::Stdout);
    assert_eq!(message.data, "hello");
}

#[tokio::test]
async fn nonzero_exit_code_is_surfaced() {
    let manager = ProcessExecutionManager::spawn("false", &[]).expect("spawn should succeed");
    let (_rx, code) = manager.run().await.expect("runs to completion");
    assert_ne!(code, 0);
}

#[tokio::test]
async fn stop_terminates_a_long_running_process() {
    let mut manager = ProcessExecutionManager::spawn("sleep", &["30".to_string()])
        .expect("spawn should succeed");
    manager.stop().await.expect("stop should succeed");
}
