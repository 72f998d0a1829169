//! Changed files relative to a base ref

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, info, instrument};

use ci_jobs_core::error::GitError;
use ci_jobs_core::monorepo::DiffSource;

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Files that differ between `base_ref` and the working directory.
    ///
    /// Staged and unstaged changes are both included; untracked files are
    /// not, matching `git diff --name-only <base_ref>`. Renames report both
    /// the old and the new path.
    #[instrument(skip(self))]
    pub fn changed_files_since(&self, base_ref: &str) -> Result<Vec<PathBuf>> {
        if self.repo.is_bare() {
            return Err(GitError::BareRepository(self.path().to_path_buf()));
        }

        let object = self.repo.revparse_single(base_ref).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => {
                GitError::RefNotFound(base_ref.to_string())
            }
            _ => GitError::Git2(e),
        })?;
        let tree = object.peel_to_tree()?;
        debug!(base_ref, tree = %tree.id(), "resolved base ref");

        let diff = self.repo.diff_tree_to_workdir_with_index(Some(&tree), None)?;

        let mut files = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    files.insert(path.to_path_buf());
                }
            }
        }

        info!(base_ref, changed_files = files.len(), "collected changed files");
        Ok(files.into_iter().collect())
    }
}

impl DiffSource for GitRepo {
    fn changed_files(&self, base_ref: &str) -> ci_jobs_core::Result<Vec<PathBuf>> {
        Ok(self.changed_files_since(base_ref)?)
    }
}
