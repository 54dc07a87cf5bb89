use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::RunnerConfig;
use crate::domain::Language;
use crate::sandbox::traits::{LaunchError, SandboxBackend, SandboxChild};

/// Backend driving the local container engine CLI.
///
/// Every run gets a fresh container with no network, a fractional CPU
/// share, hard memory and pid caps, a read-only root filesystem, the
/// workspace mounted read-only, and a small writable tmpfs for the
/// program's own scratch needs.
#[derive(Clone, Debug)]
pub struct DockerSandbox {
    config: RunnerConfig,
}

impl DockerSandbox {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Argument construction is a pure function of language and policy.
    fn run_args(&self, workspace: &Path, language: Language) -> Result<Vec<String>, LaunchError> {
        let test_command: &[&str] = match language {
            Language::Python => &["python", "-B", "-m", "unittest", "-v"],
            // Declared in the data model, but there is no execution
            // path for it; callers reject it before launch and the
            // backend refuses it as well.
            Language::NodeJs => return Err(LaunchError::UnsupportedLanguage(language)),
        };

        let mut args: Vec<String> = [
            "run",
            "--rm",
            "-i",
            "--network",
            "none",
        ]
        .map(String::from)
        .into();
        args.push(format!("--cpus={}", self.config.cpus));
        args.push(format!("--memory={}m", self.config.memory_mib));
        args.push(format!("--memory-swap={}m", self.config.memory_mib));
        args.push(format!("--pids-limit={}", self.config.pids_limit));
        args.push("--read-only".to_string());
        args.push("--tmpfs".to_string());
        args.push(format!("/tmp:rw,size={}m", self.config.scratch_mib));
        args.push("--security-opt".to_string());
        args.push("no-new-privileges".to_string());
        args.push("--cap-drop".to_string());
        args.push("ALL".to_string());
        args.push("-v".to_string());
        args.push(format!("{}:/workspace:ro", workspace.display()));
        args.push("-w".to_string());
        args.push("/workspace".to_string());
        args.push(self.config.image_for(language).to_string());
        args.extend(test_command.iter().map(|s| s.to_string()));

        Ok(args)
    }
}

#[async_trait::async_trait]
impl SandboxBackend for DockerSandbox {
    #[tracing::instrument(skip(self))]
    async fn launch(
        &self,
        workspace: &Path,
        language: Language,
    ) -> Result<SandboxChild, LaunchError> {
        let args = self.run_args(workspace, language)?;
        tracing::debug!(docker = %self.config.docker_path.display(), ?args, "starting sandbox");

        let child = Command::new(&self.config.docker_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn { source })?;

        Ok(SandboxChild::new(child))
    }
}
