use super::*;

#[tokio::test]
async fn run_with_timeout_surfaces_timeout_as_descriptive_error() {
    let mut cmd = Command::new("sleep");
    cmd.arg("5");
    let result = run_with_timeout(cmd, Duration::from_millis(50), "sleep probe").await;
    let err = result.expect_err("should time out");
    assert!(err.contains("sleep probe"));
    assert!(err.contains("timed out"));
}

#[tokio::test]
async fn run_with_timeout_returns_output_on_success() {
    let cmd = Command::new("true");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "true probe")
        .await
        .expect("should succeed");
    assert!(output.status.success());
}
