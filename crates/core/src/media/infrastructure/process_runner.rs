use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {}s", timeout.as_secs())]
    Timeout {
        program: String,
        timeout: Duration,
        stderr: String,
    },
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs external tools with captured output and a hard timeout.
///
/// The child is killed and reaped on every exit path, including timeout
/// and early returns, so a hung tool never outlives the call.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn run(&self, cmd: &mut Command) -> Result<ProcessOutput, ProcessError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        log::debug!("Running: {}", describe_command(cmd));

        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessError::Spawn {
                program: program.clone(),
                source: e,
            })?;
        let mut guard = ChildGuard::new(child);

        let stdout_handle = drain(guard.child.stdout.take());
        let stderr_handle = drain(guard.child.stderr.take());

        let start = Instant::now();
        let status = loop {
            match guard.child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if start.elapsed() >= self.timeout => {
                    guard.kill();
                    let _ = collect(stdout_handle);
                    return Err(ProcessError::Timeout {
                        program,
                        timeout: self.timeout,
                        stderr: collect(stderr_handle),
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(ProcessError::Wait { program, source: e }),
            }
        };
        guard.reaped = true;

        Ok(ProcessOutput {
            status,
            stdout: collect(stdout_handle),
            stderr: collect(stderr_handle),
        })
    }
}

/// Kills and reaps the child unless it already exited normally.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn kill(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn describe_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner(secs: u64) -> ProcessRunner {
        ProcessRunner::new(Duration::from_secs(secs))
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let out = runner(10)
            .run(Command::new("sh").args(["-c", "echo out; echo err >&2"]))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn test_non_zero_exit_is_not_an_error() {
        let out = runner(10)
            .run(Command::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .unwrap();
        assert!(!out.success());
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stderr.trim(), "boom");
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = ProcessRunner::new(Duration::from_millis(200))
            .run(Command::new("sleep").arg("30"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = runner(10)
            .run(&mut Command::new("/nonexistent/definitely-not-a-tool"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn test_large_output_does_not_deadlock() {
        let out = runner(30)
            .run(Command::new("sh").args(["-c", "head -c 1000000 /dev/zero | tr '\\0' 'a'"]))
            .unwrap();
        assert_eq!(out.stdout.len(), 1_000_000);
    }

    #[test]
    fn test_describe_command() {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-i", "in.mp4"]);
        assert_eq!(describe_command(&cmd), "ffmpeg -i in.mp4");
    }
}
