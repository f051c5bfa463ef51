//! Spawning the Cursor agent CLI.
//!
//! The agent is invoked in stream-JSON mode and reads the prompt from stdin,
//! avoiding argv length limits. The child is spawned with kill-on-drop so a
//! dropped pipeline task cannot leak a process; termination paths still kill
//! explicitly so the kill happens before the response closes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::debug;

/// Default binary name looked up on PATH.
const AGENT_BIN: &str = "cursor-agent";

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("cursor-agent not found on PATH: {0}")]
    NotFound(#[from] which::Error),
    #[error("spawn {program}: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
    #[error("agent command is empty")]
    EmptyCommand,
}

/// Fully resolved invocation of the upstream agent.
#[derive(Debug, Clone)]
pub struct AgentCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl AgentCommand {
    /// Builds the invocation for one request: stream-JSON output, model by
    /// id, prompt over stdin. `override_cmd` (whitespace-split) replaces the
    /// PATH lookup; used by tests and unusual installs.
    pub fn for_model(
        model: &str,
        cwd: &Path,
        override_cmd: Option<&str>,
    ) -> Result<Self, SpawnError> {
        let (program, mut args) = match override_cmd {
            Some(cmd) => {
                let mut parts = cmd.split_whitespace().map(String::from);
                let program = parts.next().ok_or(SpawnError::EmptyCommand)?;
                (PathBuf::from(program), parts.collect::<Vec<_>>())
            }
            None => (which::which(AGENT_BIN)?, Vec::new()),
        };
        args.extend([
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
        ]);
        if !model.is_empty() && model != "auto" {
            args.extend(["--model".to_string(), model.to_string()]);
        }
        Ok(Self {
            program,
            args,
            cwd: cwd.to_path_buf(),
        })
    }

    /// Spawns the agent and writes the prompt to its stdin.
    pub async fn spawn(&self, prompt: &str) -> Result<AgentProcess, SpawnError> {
        debug!(program = %self.program.display(), cwd = %self.cwd.display(), "spawning agent");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Io {
                program: self.program.display().to_string(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let prompt = prompt.as_bytes().to_vec();
            // Write in a task: a large prompt must not deadlock against an
            // upstream that starts emitting before stdin is drained.
            tokio::spawn(async move {
                let _ = stdin.write_all(&prompt).await;
                let _ = stdin.shutdown().await;
            });
        }

        Ok(AgentProcess { child })
    }
}

/// A running upstream process. One per request; never shared.
#[derive(Debug)]
pub struct AgentProcess {
    child: Child,
}

impl AgentProcess {
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Kills the upstream. Termination paths call this before the response
    /// closes; errors are ignored (the process may already be gone).
    pub async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }

    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}
