//! Bounded subprocess execution for git and tool commands

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Error, Debug)]
pub(crate) enum RunError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Trimmed stderr, or the exit status when stderr is empty
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exited with {}", self.status)
        } else {
            stderr.to_string()
        }
    }
}

/// Run `argv` followed by `args`, feeding `stdin` and waiting at most
/// `timeout`
///
/// The child runs in its own process group; if the deadline passes the
/// whole group is killed, so helpers the child forked die with it.
pub(crate) async fn run(
    argv: &[String],
    args: &[&str],
    cwd: Option<&Path>,
    stdin: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<CommandOutput, RunError> {
    let (program, rest) = argv.split_first().ok_or(RunError::EmptyCommand)?;

    let mut command = Command::new(program);
    command
        .args(rest)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| RunError::Spawn {
        program: program.clone(),
        source,
    })?;
    let pid = child.id();

    let input = child.stdin.take();
    let feed = async move {
        if let (Some(mut pipe), Some(bytes)) = (input, stdin) {
            match pipe.write_all(&bytes).await {
                Ok(()) => {}
                // The child may exit without reading its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    };

    let waited = tokio::time::timeout(timeout, async {
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        fed?;
        output
    })
    .await;

    let output = match waited {
        Ok(result) => result?,
        Err(_) => {
            kill_process_group(pid);
            return Err(RunError::Timeout(timeout));
        }
    };

    Ok(CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Kill every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(id) = pid {
        // SAFETY: killpg only sends a signal to the group spawned for this child
        unsafe {
            libc::killpg(id as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_stdin_is_forwarded() {
        let out = run(&sh("cat"), &[], None, Some(b"{\"a\":1}".to_vec()), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_failure_message_prefers_stderr() {
        let out = run(&sh("echo nope >&2; exit 3"), &[], None, None, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!out.status.success());
        assert_eq!(out.failure_message(), "nope");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let err = run(&sh("sleep 5"), &[], None, None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_timeout_kills_forked_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("late-write");
        let script = format!("(sleep 1; touch '{}') & sleep 10", marker.display());

        let err = run(&sh(&script), &[], None, None, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout(_)));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_empty_and_missing_commands() {
        assert!(matches!(
            run(&[], &[], None, None, Duration::from_secs(1)).await,
            Err(RunError::EmptyCommand)
        ));
        assert!(matches!(
            run(&["/nonexistent/panel-tool".to_string()], &[], None, None, Duration::from_secs(1)).await,
            Err(RunError::Spawn { .. })
        ));
    }
}
