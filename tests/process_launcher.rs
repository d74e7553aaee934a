// tests/process_launcher.rs
#![cfg(unix)]

use std::error::Error;
use std::time::Duration;

use gftpwrap::context::state::{exited, url_or_exit};
use gftpwrap::errors::GftpError;
use gftpwrap::proc::{LaunchSpec, run_blocking, spawn_streaming};
use gftpwrap::types::{ExitCode, OperationKind};
use gftpwrap_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> LaunchSpec {
    LaunchSpec::new("/bin/sh").arg("-c").arg(script)
}

#[tokio::test]
async fn blocking_mode_collects_stdout_and_stderr() -> TestResult {
    init_tracing();

    let output = with_timeout(run_blocking(&sh("echo out; echo err >&2"))).await?;

    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
    assert!(output.combined().contains("out"));
    assert!(output.combined().contains("err"));
    Ok(())
}

#[tokio::test]
async fn blocking_mode_reports_non_zero_exit_with_output() -> TestResult {
    init_tracing();

    let res = with_timeout(run_blocking(&sh("echo partial; echo broken >&2; exit 3"))).await;

    match res {
        Err(GftpError::ProcessExit { code, output }) => {
            assert_eq!(code, ExitCode::Code(3));
            assert!(output.contains("partial"));
            assert!(output.contains("broken"));
            Ok(())
        }
        other => Err(format!("expected ProcessExit, got {other:?}").into()),
    }
}

#[tokio::test]
async fn missing_executable_is_a_spawn_error() -> TestResult {
    init_tracing();

    let spec = LaunchSpec::new("/definitely/not/a/gftp/binary").arg("--version");
    match spawn_streaming(&spec, OperationKind::Publish) {
        Err(GftpError::Spawn { program, .. }) => {
            assert_eq!(program, spec.program());
            Ok(())
        }
        other => Err(format!("expected Spawn error, got {other:?}").into()),
    }
}

#[tokio::test]
async fn environment_overrides_reach_the_child() -> TestResult {
    init_tracing();

    let spec = sh("printf '%s' \"$GSB_URL\"").env("GSB_URL", "tcp://10.0.0.1:7464");
    let output = with_timeout(run_blocking(&spec)).await?;

    assert_eq!(output.stdout, "tcp://10.0.0.1:7464");
    Ok(())
}

#[tokio::test]
async fn streaming_mode_records_events_before_exit() -> TestResult {
    init_tracing();

    let script = r#"
echo 'warming up'
printf '{"cur":1,"tot":4,'
sleep 0.05
printf '"spc":1,"spt":1,"elp":0}\n'
echo '{"result":{"file":"a.bin","url":"gftp://0x1/a"}}'
printf '{"cur":4,"tot":4,"spc":2,"spt":2,"elp":1}'
"#;
    let ctx = spawn_streaming(&sh(script), OperationKind::Download)?;
    let state = with_timeout(ctx.wait_until(exited)).await?;

    assert_eq!(state.exit_code(), Some(ExitCode::Code(0)));
    assert_eq!(state.url(), Some("gftp://0x1/a"));
    // Unterminated last line still lands before the exit is recorded.
    assert_eq!(state.progress().map(|p| p.current), Some(4));
    assert!(state.error().is_none());
    Ok(())
}

#[tokio::test]
async fn streaming_mode_reports_exit_code_without_events() -> TestResult {
    init_tracing();

    let ctx = spawn_streaming(&sh("echo noise >&2; exit 2"), OperationKind::Download)?;
    let state = with_timeout(ctx.wait_until(exited)).await?;

    assert_eq!(state.exit_code(), Some(ExitCode::Code(2)));
    assert!(state.error().is_none());
    assert!(state.progress().is_none());
    Ok(())
}

#[tokio::test]
async fn signal_termination_is_distinguished() -> TestResult {
    init_tracing();

    let ctx = spawn_streaming(&sh("kill -9 $$"), OperationKind::Publish)?;
    let state = with_timeout(ctx.wait_until(exited)).await?;

    assert_eq!(state.exit_code(), Some(ExitCode::Signal(9)));
    assert_eq!(state.exit_code().and_then(|c| c.code()), None);
    Ok(())
}

#[tokio::test]
async fn interrupt_reaches_the_process() -> TestResult {
    init_tracing();

    let script = r#"
trap 'exit 7' INT
echo '{"result":{"file":"f","url":"ready"}}'
while true; do sleep 0.05; done
"#;
    let ctx = spawn_streaming(&sh(script), OperationKind::Publish)?;

    // Only interrupt once the trap is installed.
    let ready = with_timeout(ctx.wait_until(url_or_exit)).await?;
    assert_eq!(ready.url(), Some("ready"));

    ctx.interrupt().await;
    let state = with_timeout(ctx.wait_until(exited)).await?;

    assert_eq!(state.exit_code(), Some(ExitCode::Code(7)));
    Ok(())
}

#[tokio::test]
async fn bounded_wait_gives_up_without_touching_the_process() -> TestResult {
    init_tracing();

    let ctx = spawn_streaming(&sh("while true; do sleep 0.05; done"), OperationKind::Download)?;

    let res = ctx
        .wait_until_within(Duration::from_millis(150), exited)
        .await?;
    assert!(res.is_none());
    assert!(ctx.exit_code().is_none());

    ctx.kill().await;
    let state = with_timeout(ctx.wait_until(exited)).await?;
    assert_eq!(state.exit_code(), Some(ExitCode::Signal(9)));
    Ok(())
}

#[tokio::test]
async fn subscribers_observe_progress_updates() -> TestResult {
    init_tracing();

    let script = r#"
sleep 0.05
echo '{"cur":5,"tot":10,"spc":1,"spt":1,"elp":0}'
sleep 0.05
"#;
    let ctx = spawn_streaming(&sh(script), OperationKind::Download)?;
    let mut rx = ctx.subscribe();

    let seen = with_timeout(rx.wait_for(|s| s.progress().is_some())).await?;
    assert_eq!(seen.progress().map(|p| p.current), Some(5));
    drop(seen);

    with_timeout(ctx.wait_until(exited)).await?;
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_on_stderr_does_not_stop_the_drain() -> TestResult {
    init_tracing();

    let script = r#"
printf '\377\376 bad\n' >&2
sleep 0.2
i=0
while [ $i -lt 2000 ]; do
  echo "diagnostic line $i" >&2
  i=$((i+1))
done
echo '{"result":{"file":"a","url":"gftp://x"}}'
exit 0
"#;
    let ctx = spawn_streaming(&sh(script), OperationKind::Publish)?;
    let state = with_timeout(ctx.wait_until(exited)).await?;

    assert_eq!(state.exit_code(), Some(ExitCode::Code(0)));
    assert_eq!(state.url(), Some("gftp://x"));
    Ok(())
}

async fn is_alive(pid: u32) -> Result<bool, Box<dyn Error>> {
    let status = tokio::process::Command::new("/bin/sh")
        .arg("-c")
        .arg(format!("kill -0 {pid} 2>/dev/null"))
        .status()
        .await?;
    Ok(status.success())
}

#[tokio::test]
async fn dropping_the_context_kills_the_process() -> TestResult {
    init_tracing();

    let ctx = spawn_streaming(&sh("while true; do sleep 0.05; done"), OperationKind::Publish)?;
    let pid = ctx.pid().ok_or("process has no pid")?;
    assert!(is_alive(pid).await?);

    drop(ctx);

    with_timeout(async {
        while is_alive(pid).await? {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok::<(), Box<dyn Error>>(())
    })
    .await?;
    Ok(())
}

#[test]
fn unknown_exit_status_has_no_code() {
    let code = ExitCode::Unknown;

    assert!(!code.success());
    assert_eq!(code.code(), None);
    assert_eq!(code.to_string(), "unknown exit status");
    assert_eq!(
        GftpError::TransferFailed(code).to_string(),
        "transfer failed: gftp exited with unknown exit status"
    );
}
