use std::path::PathBuf;
use std::time::Duration;

use crate::domain::Language;

/// Execution policy for sandboxed runs. Passed explicitly into the
/// backend and facade at construction time; there is no ambient global
/// configuration.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Container engine binary. Overridable so launch failures can be
    /// exercised without a daemon.
    pub docker_path: PathBuf,
    pub python_image: String,
    pub node_image: String,
    /// Wall-clock budget for one run.
    pub timeout: Duration,
    /// Fraction of one core the sandbox may use.
    pub cpus: f64,
    /// Memory hard cap in MiB. Swap is capped to the same value, so the
    /// sandbox cannot expand past it.
    pub memory_mib: u64,
    /// Process/thread ceiling inside the sandbox.
    pub pids_limit: u32,
    /// Size of the writable scratch tmpfs in MiB.
    pub scratch_mib: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            docker_path: PathBuf::from("docker"),
            python_image: "runner-python:3.12".to_string(),
            node_image: "runner-node:20".to_string(),
            timeout: Duration::from_millis(30_000),
            cpus: 0.5,
            memory_mib: 256,
            pids_limit: 128,
            scratch_mib: 64,
        }
    }
}

impl RunnerConfig {
    /// Builds the default policy with the recognized environment
    /// overrides applied: `RUNNER_PYTHON_IMAGE`, `RUNNER_NODE_IMAGE`
    /// and `RUNNER_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(image) = std::env::var("RUNNER_PYTHON_IMAGE") {
            config.python_image = image;
        }
        if let Ok(image) = std::env::var("RUNNER_NODE_IMAGE") {
            config.node_image = image;
        }
        if let Ok(raw) = std::env::var("RUNNER_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config.timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable RUNNER_TIMEOUT_MS"),
            }
        }
        config
    }

    pub fn image_for(&self, language: Language) -> &str {
        match language {
            Language::Python => &self.python_image,
            Language::NodeJs => &self.node_image,
        }
    }
}
