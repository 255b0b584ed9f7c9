use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Debug)]
pub enum RunnerError {
    ScriptMissing(PathBuf),
    Spawn(std::io::Error),
    /// Non-zero exit; carries whatever the script wrote to stderr.
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    /// Exit was clean but the script emitted diagnostics on stderr.
    Stderr(String),
    TimedOut(Duration),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScriptMissing(path) => {
                write!(f, "script not found at {}", path.display())
            }
            Self::Spawn(err) => write!(f, "failed to spawn script: {err}"),
            Self::Failed { exit_code, stderr } => match exit_code {
                Some(code) => write!(f, "script exited with status {code}: {stderr}"),
                None => write!(f, "script was terminated by a signal: {stderr}"),
            },
            Self::Stderr(stderr) => write!(f, "script reported errors: {stderr}"),
            Self::TimedOut(timeout) => {
                write!(f, "script did not finish within {}s", timeout.as_secs())
            }
        }
    }
}

impl std::error::Error for RunnerError {}

/// Runs one external script with an input file path as its sole data
/// argument. Runs are bounded by a shared permit pool and an explicit
/// timeout so a hanging script cannot exhaust the server.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    script: PathBuf,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl ScriptRunner {
    pub fn new(
        interpreter: impl Into<String>,
        script: impl Into<PathBuf>,
        timeout: Duration,
        permits: Arc<Semaphore>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            timeout,
            permits,
        }
    }

    /// Runner with its own single-run permit, for one-off invocations.
    pub fn standalone(
        interpreter: impl Into<String>,
        script: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self::new(interpreter, script, timeout, Arc::new(Semaphore::new(1)))
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Captured stdout on success; non-zero exit or any stderr output is a
    /// failure carrying the diagnostic text.
    pub async fn run(&self, input_path: &str) -> Result<String, RunnerError> {
        if !self.script.is_file() {
            return Err(RunnerError::ScriptMissing(self.script.clone()));
        }

        // Closed only on shutdown; treat that as a spawn failure.
        let _permit = self.permits.acquire().await.map_err(|_| {
            RunnerError::Spawn(std::io::Error::other("runner permit pool is closed"))
        })?;

        info!(script = %self.script.display(), input_path, "running external script");

        let child = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return Err(RunnerError::Spawn(err)),
            Err(_) => {
                warn!(script = %self.script.display(), "script timed out and was killed");
                return Err(RunnerError::TimedOut(self.timeout));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(RunnerError::Failed {
                exit_code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(RunnerError::Stderr(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
