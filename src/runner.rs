use std::collections::BTreeMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::HarnessError;

#[derive(Debug, Clone)]
pub struct CommandExecution {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl CommandExecution {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Spawns a child process and waits for it. Swappable so the CLI driver can be
/// exercised without a real terraform.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        working_dir: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<CommandExecution, HarnessError>;
}

pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        working_dir: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<CommandExecution, HarnessError> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.current_dir(working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // A timed-out invocation drops this future; take the child down with it.
        cmd.kill_on_drop(true);
        for (key, value) in env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| HarnessError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

        let output = child.wait_with_output().await.map_err(|source| {
            HarnessError::io(format!("{} wait failed", program.display()), source)
        })?;

        Ok(CommandExecution {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status,
        })
    }
}
