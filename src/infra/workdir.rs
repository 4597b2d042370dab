//! Per-request working storage for one compilation job.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::error::InfraError;

/// A uniquely named directory holding every source file for one compilation
/// job. Disposal is guaranteed on every exit path: [`dispose`] removes the
/// tree and logs failures, and the `Drop` of the inner handle removes it if
/// the request unwinds before disposal runs.
///
/// [`dispose`]: RenderWorkspace::dispose
#[derive(Debug)]
pub struct RenderWorkspace {
    dir: TempDir,
}

impl RenderWorkspace {
    /// Create the base path (with parents) if needed and claim a fresh job
    /// directory inside it. Each request gets its own directory, so
    /// concurrent renders never share sources.
    pub fn create(base: &Path) -> Result<Self, InfraError> {
        fs::create_dir_all(base)?;
        let dir = tempfile::Builder::new().prefix("job-").tempdir_in(base)?;
        debug!(
            target = "ricetta::workdir",
            path = %dir.path().display(),
            "workspace created"
        );
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it. Failures are logged and
    /// swallowed; the response already in flight takes precedence over a
    /// failed cleanup.
    pub fn dispose(self) {
        let path: PathBuf = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(
                target = "ricetta::workdir",
                path = %path.display(),
                "workspace removed"
            ),
            Err(err) => warn!(
                target = "ricetta::workdir",
                path = %path.display(),
                error = %err,
                "failed to remove workspace"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_base_path_with_parents() {
        let root = TempDir::new().expect("temp root");
        let base = root.path().join("nested").join("jobs");

        let workspace = RenderWorkspace::create(&base).expect("workspace");
        assert!(workspace.path().starts_with(&base));
        assert!(workspace.path().is_dir());
    }

    #[test]
    fn workspaces_are_unique_per_request() {
        let root = TempDir::new().expect("temp root");
        let a = RenderWorkspace::create(root.path()).expect("a");
        let b = RenderWorkspace::create(root.path()).expect("b");
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn dispose_removes_the_directory_and_contents() {
        let root = TempDir::new().expect("temp root");
        let workspace = RenderWorkspace::create(root.path()).expect("workspace");
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("macro.tex"), "x").expect("write");

        workspace.dispose();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_the_directory_if_dispose_never_ran() {
        let root = TempDir::new().expect("temp root");
        let path = {
            let workspace = RenderWorkspace::create(root.path()).expect("workspace");
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
