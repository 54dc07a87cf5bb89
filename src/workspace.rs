use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::Language;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to provision workspace: {source}")]
    ResourceExhaustion {
        #[source]
        source: std::io::Error,
    },
}

/// Ephemeral staging directory for a single run. Holds exactly the
/// candidate solution file and the test file, both at fixed names, and
/// is owned exclusively by one execution.
///
/// Deletion is unconditional: `release` removes the tree on the normal
/// path, and `Drop` repeats the removal best-effort so the directory
/// also disappears when the supervising logic errors or panics.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Allocates a fresh uniquely-named directory under `root`.
    ///
    /// Allocation failure is not retried; it propagates as
    /// [`WorkspaceError::ResourceExhaustion`] before any sandbox starts.
    pub async fn create(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let path = root.as_ref().join(format!("runner-{}", Uuid::new_v4()));
        fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkspaceError::ResourceExhaustion { source })?;

        tracing::debug!(path = %path.display(), "workspace created");
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the candidate and test sources into the workspace under
    /// the language's fixed filenames. Both files are flushed before
    /// this returns, so a sandbox launched afterwards never observes a
    /// partial write.
    pub async fn write_sources(
        &self,
        language: Language,
        candidate_source: &str,
        test_source: &str,
    ) -> Result<(), WorkspaceError> {
        self.write_file(language.solution_file(), candidate_source)
            .await?;
        self.write_file(language.test_file(), test_source).await?;
        Ok(())
    }

    async fn write_file(&self, name: &str, contents: &str) -> Result<(), WorkspaceError> {
        let map_err = |source| WorkspaceError::ResourceExhaustion { source };

        let mut file = fs::File::create(self.path.join(name)).await.map_err(map_err)?;
        file.write_all(contents.as_bytes()).await.map_err(map_err)?;
        file.flush().await.map_err(map_err)?;
        drop(file);

        Ok(())
    }

    /// Recursively deletes the workspace. Deletion failures are logged
    /// and swallowed so cleanup never masks the run's primary result.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = fs::remove_dir_all(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove workspace"
                );
            }
        } else {
            tracing::debug!(path = %self.path.display(), "workspace removed");
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove workspace on drop"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_release() {
        let workspace = Workspace::create(std::env::temp_dir())
            .await
            .expect("Failed to create workspace");
        let path = workspace.path().to_path_buf();

        assert!(path.is_dir());

        workspace.release().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_sources_fixed_names() {
        let workspace = Workspace::create(std::env::temp_dir())
            .await
            .expect("Failed to create workspace");

        workspace
            .write_sources(
                Language::Python,
                "def add(a, b):\n    return a + b\n",
                "import unittest\n",
            )
            .await
            .expect("Failed to write sources");

        let solution = tokio::fs::read_to_string(workspace.path().join("solution.py"))
            .await
            .unwrap();
        let tests = tokio::fs::read_to_string(workspace.path().join("test_solution.py"))
            .await
            .unwrap();

        assert_eq!(solution, "def add(a, b):\n    return a + b\n");
        assert_eq!(tests, "import unittest\n");

        workspace.release().await;
    }

    #[tokio::test]
    async fn test_create_on_readonly_root_is_resource_exhaustion() {
        // /proc is a readonly dir
        let result = Workspace::create("/proc/sandbox-runner").await;

        assert!(matches!(
            result,
            Err(WorkspaceError::ResourceExhaustion { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_workspaces_do_not_collide() {
        let a = Workspace::create(std::env::temp_dir()).await.unwrap();
        let b = Workspace::create(std::env::temp_dir()).await.unwrap();

        assert_ne!(a.path(), b.path());

        a.release().await;
        b.release().await;
    }

    #[tokio::test]
    async fn test_drop_removes_workspace() {
        let workspace = Workspace::create(std::env::temp_dir())
            .await
            .expect("Failed to create workspace");
        let path = workspace.path().to_path_buf();

        drop(workspace);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_after_external_removal_is_silent() {
        let workspace = Workspace::create(std::env::temp_dir()).await.unwrap();
        tokio::fs::remove_dir_all(workspace.path()).await.unwrap();

        // Must not panic or surface the error
        workspace.release().await;
    }
}
