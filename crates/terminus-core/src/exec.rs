// ── Remote command execution channel ──
//
// Environments run commands on their application server over ssh. The
// `RemoteExecutor` trait is the seam between command policy (in
// `model::environment`) and the channel that actually carries the bytes.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::CoreError;

/// Port the platform's application servers accept ssh on.
pub const SSH_PORT: u16 = 2222;

/// Where a command for one environment is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl SshTarget {
    pub fn for_environment(site_id: &str, env_id: &str) -> Self {
        Self {
            user: format!("{env_id}.{site_id}"),
            host: format!("appserver.{env_id}.{site_id}.drush.in"),
            port: SSH_PORT,
        }
    }

    /// `user@host`, as ssh expects it.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Captured result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Combined stdout and stderr.
    pub output: String,
    pub exit_code: i32,
}

/// A channel that can run a shell command on an environment.
pub trait RemoteExecutor {
    fn run(
        &self,
        target: &SshTarget,
        command: &str,
    ) -> impl Future<Output = Result<CommandOutput, CoreError>> + Send;
}

/// Runs commands through the local `ssh` binary.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    program: String,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self {
            program: "ssh".into(),
        }
    }
}

impl SshExecutor {
    /// Use a different ssh-compatible program (wrappers, test doubles).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(target: &SshTarget, command: &str) -> Vec<String> {
        vec![
            "-T".into(),
            target.destination(),
            "-p".into(),
            target.port.to_string(),
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            "AddressFamily=inet".into(),
            command.into(),
        ]
    }
}

impl RemoteExecutor for SshExecutor {
    async fn run(&self, target: &SshTarget, command: &str) -> Result<CommandOutput, CoreError> {
        debug!(program = %self.program, destination = %target.destination(), "running remote command");

        let output = Command::new(&self.program)
            .args(Self::args(target, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            output: text,
            // Killed by a signal: no code, report a generic failure.
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
