use std::path::Path;
use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::domain::{ExecutionRequest, ExecutionResult, Language, MAX_SOURCE_CHARS};
use crate::sandbox::docker::DockerSandbox;
use crate::sandbox::traits::SandboxBackend;
use crate::supervise::supervise;
use crate::workspace::{Workspace, WorkspaceError};

/// Pre-flight failures. Anything that happens after a sandbox might
/// have started is folded into the [`ExecutionResult`] instead.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{which} source exceeds {MAX_SOURCE_CHARS} characters")]
    SourceTooLarge { which: &'static str },
    #[error("execution is not supported for {0:?}")]
    UnsupportedLanguage(Language),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Entry point for one-shot sandboxed runs.
///
/// Each accepted request gets its own workspace and its own sandboxed
/// process; concurrent runs share nothing. The returned result is
/// settled exactly once per request: the caller either gets a
/// pre-flight [`RunError`] or a fully-formed [`ExecutionResult`],
/// never a hang.
#[derive(Clone, Debug)]
pub struct TestRunner {
    config: RunnerConfig,
    backend: Arc<dyn SandboxBackend>,
}

impl TestRunner {
    pub fn new(config: RunnerConfig, backend: Arc<dyn SandboxBackend>) -> Self {
        Self { config, backend }
    }

    /// Convenience constructor wiring the local container engine.
    pub fn with_docker(config: RunnerConfig) -> Self {
        let backend = Arc::new(DockerSandbox::new(config.clone()));
        Self::new(config, backend)
    }

    #[tracing::instrument(skip(self, request), fields(language = ?request.language))]
    pub async fn run(&self, request: ExecutionRequest) -> Result<ExecutionResult, RunError> {
        validate(&request)?;

        let workspace = Workspace::create(std::env::temp_dir()).await?;
        workspace
            .write_sources(
                request.language,
                &request.candidate_source,
                &request.test_source,
            )
            .await?;

        // Everything past this point resolves to a result; the
        // workspace is released on this path and by its Drop guard on
        // every other one.
        let result = self.execute(workspace.path(), request.language).await;
        workspace.release().await;

        tracing::info!(
            success = result.success,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            "run finished"
        );
        Ok(result)
    }

    async fn execute(&self, workspace: &Path, language: Language) -> ExecutionResult {
        match self.backend.launch(workspace, language).await {
            Ok(child) => supervise(child, self.config.timeout).await,
            Err(e) => {
                tracing::error!(error = %e, "sandbox launch failed");
                ExecutionResult {
                    success: false,
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: format!("\n[Runner error: {e}]\n"),
                    timed_out: false,
                }
            }
        }
    }
}

fn validate(request: &ExecutionRequest) -> Result<(), RunError> {
    if request.candidate_source.chars().count() > MAX_SOURCE_CHARS {
        return Err(RunError::SourceTooLarge { which: "candidate" });
    }
    if request.test_source.chars().count() > MAX_SOURCE_CHARS {
        return Err(RunError::SourceTooLarge { which: "test" });
    }
    match request.language {
        Language::Python => Ok(()),
        Language::NodeJs => Err(RunError::UnsupportedLanguage(request.language)),
    }
}
