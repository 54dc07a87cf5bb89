use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::ExecutionResult;
use crate::sandbox::traits::SandboxChild;
use crate::settle::SettleOnce;

/// Marker appended to captured stderr when a run is killed by the wall
/// clock.
pub const TIMEOUT_MARKER: &str = "[Runner timed out]";

/// Terminal state of the race between natural exit, the wall clock and
/// runner-process faults. Exactly one of these settles per run.
#[derive(Debug)]
enum RunOutcome {
    Exited(ExitStatus),
    TimedOut,
    Fault(std::io::Error),
}

/// Supervises a launched sandbox process until it terminates.
///
/// Stdout and stderr are accumulated concurrently for the lifetime of
/// the process while its natural exit races a wall-clock timeout. On
/// timeout the process receives a non-catchable kill and is reaped
/// before this returns, so the workspace can be released safely
/// afterwards.
#[tracing::instrument(skip(child))]
pub async fn supervise(mut child: SandboxChild, timeout: Duration) -> ExecutionResult {
    let stdout_buf = Arc::new(Mutex::new(String::new()));
    let stderr_buf = Arc::new(Mutex::new(String::new()));

    let stdout_task = child
        .take_stdout()
        .map(|stream| spawn_capture(stream, stdout_buf.clone()));
    let stderr_task = child
        .take_stderr()
        .map(|stream| spawn_capture(stream, stderr_buf.clone()));

    let settled = SettleOnce::new();
    tokio::select! {
        status = child.wait() => {
            let outcome = match status {
                Ok(status) => RunOutcome::Exited(status),
                Err(e) => RunOutcome::Fault(e),
            };
            settled.settle(outcome);
        }
        _ = tokio::time::sleep(timeout) => {
            if let Err(e) = child.force_kill() {
                tracing::warn!(error = %e, "failed to kill timed-out sandbox");
            }
            // Reap before settling so no orphan outlives the run
            let _ = child.wait().await;
            settled.settle(RunOutcome::TimedOut);
        }
    }

    let outcome = settled
        .into_inner()
        .expect("run must settle exactly one outcome");
    tracing::debug!(?outcome, "run settled");

    let readers: Vec<_> = [stdout_task, stderr_task].into_iter().flatten().collect();
    if matches!(outcome, RunOutcome::Exited(_)) {
        // Pipes closed at exit; drain the buffered tail of both streams
        let _ = futures::future::join_all(readers).await;
    } else {
        // A killed process can leave the pipe write end inherited by
        // stragglers that never close it; take the buffers as they
        // stand instead of waiting for EOF
        for task in &readers {
            task.abort();
        }
        let _ = futures::future::join_all(readers).await;
    }

    let stdout = stdout_buf.lock().await.clone();
    let mut stderr = stderr_buf.lock().await.clone();

    match outcome {
        RunOutcome::Exited(status) => {
            // Killed-by-signal has no exit code; report the sentinel
            let exit_code = status.code().unwrap_or(-1);
            ExecutionResult {
                success: exit_code == 0,
                exit_code,
                stdout,
                stderr,
                timed_out: false,
            }
        }
        RunOutcome::TimedOut => {
            stderr.push_str(&format!("\n{TIMEOUT_MARKER}\n"));
            ExecutionResult {
                success: false,
                exit_code: -1,
                stdout,
                stderr,
                timed_out: true,
            }
        }
        RunOutcome::Fault(e) => {
            stderr.push_str(&format!("\n[Runner error: {e}]\n"));
            ExecutionResult {
                success: false,
                exit_code: -1,
                stdout,
                stderr,
                timed_out: false,
            }
        }
    }
}

fn spawn_capture<R>(mut stream: R, buf: Arc<Mutex<String>>) -> JoinHandle<()>
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buf
                    .lock()
                    .await
                    .push_str(&String::from_utf8_lossy(&chunk[..n])),
                Err(e) => {
                    tracing::debug!(error = %e, "output stream closed with error");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::time::Instant;
    use tokio::process::Command;

    fn spawn_sh(script: &str) -> SandboxChild {
        let child = Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn test process");
        SandboxChild::new(child)
    }

    #[tokio::test]
    async fn test_natural_exit_success() {
        let child = spawn_sh("echo out; echo err >&2");

        let result = supervise(child, Duration::from_secs(10)).await;

        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn test_natural_exit_failure_keeps_real_code() {
        let child = spawn_sh("echo boom >&2; exit 3");

        let result = supervise(child, Duration::from_secs(10)).await;

        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stderr, "boom\n");
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn test_killed_by_signal_maps_to_sentinel() {
        let child = spawn_sh("kill -KILL $$");

        let result = supervise(child, Duration::from_secs(10)).await;

        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn test_timeout_kills_and_marks() {
        let child = spawn_sh("echo partial; sleep 30");

        let started = Instant::now();
        let result = supervise(child, Duration::from_millis(200)).await;

        // Bounded latency: resolves near the budget, never hangs
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(!result.success);
        assert_eq!(result.exit_code, -1);
        assert!(result.timed_out);
        assert_eq!(result.stdout, "partial\n");
        assert!(result.stderr.contains(TIMEOUT_MARKER));
    }

    #[tokio::test]
    async fn test_large_output_is_fully_captured() {
        // Output far beyond the pipe buffer must not deadlock the
        // exit/timeout race.
        let child = spawn_sh("head -c 1000000 /dev/zero | tr '\\0' 'a'");

        let result = supervise(child, Duration::from_secs(30)).await;

        assert!(result.success);
        assert_eq!(result.stdout.len(), 1_000_000);
    }
}
