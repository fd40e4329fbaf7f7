//! Launching the external analysis process.

use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use sentiscope_core::AppConfig;
use tokio::process::Command;

use crate::error::InvokeError;
use crate::types::ProcessOutcome;

/// Runs the external analyzer for a single keyword.
pub trait Invoker: Send + Sync {
    fn invoke(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<ProcessOutcome, InvokeError>> + Send;
}

impl<T: Invoker> Invoker for Arc<T> {
    fn invoke(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<ProcessOutcome, InvokeError>> + Send {
        (**self).invoke(keyword)
    }
}

/// Spawns one OS process per call: `program [args..] <keyword>`.
///
/// The keyword is passed as a single argument without any shell in between.
/// The child is killed if the returned future is dropped before it exits
/// (client disconnect, timeout).
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessInvoker {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.analyzer_program.clone())
            .with_args(config.analyzer_args.iter().cloned())
            .with_timeout(config.analysis_timeout())
    }

    /// Arguments placed before the keyword.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Invoker for ProcessInvoker {
    async fn invoke(&self, keyword: &str) -> Result<ProcessOutcome, InvokeError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(keyword)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        tracing::debug!(program = %self.program, pid = ?child.id(), "analyzer process started");

        // Both pipes are drained concurrently until the process exits.
        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| InvokeError::TimedOut {
                    program: self.program.clone(),
                    timeout: limit,
                })?,
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| InvokeError::Wait {
            program: self.program.clone(),
            source,
        })?;

        let outcome = ProcessOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            program = %self.program,
            exit_code = outcome.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "analyzer process exited"
        );

        Ok(outcome)
    }
}
