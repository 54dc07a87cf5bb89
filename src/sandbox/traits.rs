use std::path::Path;
use std::process::ExitStatus;

use tokio::process::{Child, ChildStderr, ChildStdout};

use crate::domain::Language;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The sandbox runtime could not start the process (binary missing,
    /// daemon unreachable, permission denied). Never retried.
    #[error("failed to start sandbox process: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },
    #[error("no sandbox command is implemented for {0:?}")]
    UnsupportedLanguage(Language),
}

/// Handle to a launched sandboxed process with piped output channels.
#[derive(Debug)]
pub struct SandboxChild {
    child: Child,
}

impl SandboxChild {
    pub fn new(child: Child) -> Self {
        Self { child }
    }

    /// Takes the stdout channel. Yields `None` on a second take.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Takes the stderr channel. Yields `None` on a second take.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Suspends until the process exits and returns its status.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Delivers SIGKILL. The sandboxed program is untrusted and must
    /// not be able to ignore or delay termination, so no graceful
    /// signal is attempted first. The caller still has to `wait` to
    /// reap the process.
    pub fn force_kill(&mut self) -> std::io::Result<()> {
        self.child.start_kill()
    }
}

/// Isolation backend capable of starting a resource-capped process for
/// one workspace. Concrete backends decide how the caps are enforced;
/// the supervisor only ever sees a [`SandboxChild`].
#[mockall::automock]
#[async_trait::async_trait]
pub trait SandboxBackend: std::fmt::Debug + Send + Sync {
    /// Starts the sandboxed process for `language` with `workspace`
    /// mounted read-only as its working directory.
    async fn launch(
        &self,
        workspace: &Path,
        language: Language,
    ) -> Result<SandboxChild, LaunchError>;
}
