//! Bounded-time execution of external executables.
//!
//! Children are spawned with `kill_on_drop`, so a timed out or abandoned
//! invocation never leaves the process running.

use std::{
    io::{self, ErrorKind},
    path::PathBuf,
    process::{Output, Stdio},
    time::Duration,
};
use thiserror::Error;
use tokio::{io::AsyncWriteExt, process::Command};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot launch {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("i/o error while talking to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} did not finish in {timeout:?}")]
    Timeout { path: PathBuf, timeout: Duration },
}

/// Runs `command` to completion.
///
/// `stdin` is written concurrently with draining stdout and stderr, so
/// children producing output before consuming their whole input cannot
/// deadlock.
pub async fn run(
    mut command: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> Result<Output, ProcessError> {
    let path = PathBuf::from(command.as_std().get_program());
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        path: path.clone(),
        source,
    })?;

    let write_input = {
        let pipe = child.stdin.take();
        async move {
            match (pipe, stdin) {
                (Some(mut pipe), Some(data)) => {
                    let result = pipe.write_all(data).await;
                    drop(pipe);
                    match result {
                        // the child is allowed to exit without reading everything
                        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
                        result => result,
                    }
                }
                _ => Ok(()),
            }
        }
    };

    let execution = async {
        let (written, output) = futures::join!(write_input, child.wait_with_output());
        written.and(output)
    };

    match tokio::time::timeout(timeout, execution).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ProcessError::Io { path, source }),
        Err(_elapsed) => Err(ProcessError::Timeout { path, timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn passes_stdin_and_captures_streams() {
        let mut command = Command::new("sh");
        command.args(["-c", "cat; echo warning >&2"]);
        let output = run(command, Some(b"6080604052"), Duration::from_secs(10))
            .await
            .expect("process should succeed");

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "6080604052");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "warning\n");
    }

    #[tokio::test]
    async fn missing_executable_is_spawn_error() {
        let command = Command::new("/definitely/not/existing/solc");
        let err = run(command, None, Duration::from_secs(10))
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, ProcessError::Spawn { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn slow_process_times_out() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let err = run(command, None, Duration::from_millis(100))
            .await
            .expect_err("process should time out");
        assert!(matches!(err, ProcessError::Timeout { .. }), "{err:?}");
    }
}
