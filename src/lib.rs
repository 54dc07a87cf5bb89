//! Sandboxed execution of untrusted candidate code against a
//! teacher-supplied test file.
//!
//! One call runs one candidate/test pair inside an isolated,
//! resource-capped container and returns a structured pass/fail result
//! within a bounded time:
//!
//! ```no_run
//! use sandbox_runner::{ExecutionRequest, Language, RunnerConfig, TestRunner};
//!
//! # async fn demo() -> Result<(), sandbox_runner::RunError> {
//! let runner = TestRunner::with_docker(RunnerConfig::from_env());
//! let result = runner
//!     .run(ExecutionRequest {
//!         candidate_source: "def add(a, b):\n    return a + b\n".to_string(),
//!         test_source: concat!(
//!             "import unittest\n",
//!             "from solution import add\n\n",
//!             "class TestAdd(unittest.TestCase):\n",
//!             "    def test_add(self):\n",
//!             "        self.assertEqual(add(1, 2), 3)\n",
//!         )
//!         .to_string(),
//!         language: Language::Python,
//!     })
//!     .await?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```
//!
//! The sandbox boundary, not the executed code, enforces the ceilings:
//! no network, fractional CPU, hard memory and pid caps, read-only
//! filesystems. Authorization and persistence are the caller's problem;
//! this crate only decides how a run is executed safely.

pub mod config;
pub mod domain;
pub mod runner;
pub mod sandbox;
pub mod settle;
pub mod supervise;
pub mod workspace;

pub use config::RunnerConfig;
pub use domain::{ExecutionRequest, ExecutionResult, Language, MAX_SOURCE_CHARS};
pub use runner::{RunError, TestRunner};
pub use sandbox::docker::DockerSandbox;
pub use sandbox::traits::{LaunchError, SandboxBackend, SandboxChild};
pub use supervise::TIMEOUT_MARKER;
pub use workspace::{Workspace, WorkspaceError};
