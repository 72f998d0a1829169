//! Loading the workspace shared by the graph-based commands

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use ci_jobs_core::config::{find_config, load_config, workspace_root};
use ci_jobs_core::{
    expand, AffectedSet, ChangeDetector, ChangeSet, CiJobsError, Config, ConfigError, ProjectGraph,
};
use ci_jobs_git::GitRepo;

use crate::cli::output;

/// Error context naming the configuration file an error stems from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation(pub PathBuf);

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}", self.0.display())
    }
}

/// Attach the config file to errors caused by its content
fn located(err: CiJobsError, config_path: &Path) -> anyhow::Error {
    if err.is_configuration() {
        anyhow::Error::new(err).context(ConfigLocation(config_path.to_path_buf()))
    } else {
        err.into()
    }
}

/// Loaded configuration and the project graph built from it
pub struct Workspace {
    pub config: Config,
    pub config_path: PathBuf,
    /// Directory project paths are relative to
    pub root: PathBuf,
    pub graph: ProjectGraph,
}

impl Workspace {
    /// Load the configuration at `config`, or search for one from the current directory
    pub fn load(config: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match config {
            Some(path) => path.to_path_buf(),
            None => {
                let cwd = std::env::current_dir()?;
                find_config(&cwd).ok_or_else(|| CiJobsError::from(ConfigError::NotFound(cwd)))?
            }
        };

        let config = load_config(&config_path).map_err(|err| located(err, &config_path))?;
        let graph = config
            .graph()
            .map_err(|err| located(err.into(), &config_path))?;
        let root = workspace_root(&config_path);

        info!(
            config = %config_path.display(),
            root = %root.display(),
            projects = graph.len(),
            "loaded workspace"
        );
        Ok(Self {
            config,
            config_path,
            root,
            graph,
        })
    }

    /// Changes since `base_ref`; every project counts as changed when it is empty
    pub fn changes(&self, base_ref: &str, chatty: bool) -> anyhow::Result<ChangeSet> {
        if base_ref.trim().is_empty() {
            warn!("no base ref given, treating every project as changed");
            if chatty {
                output::warning("No base ref given; treating every project as changed");
            }
            return Ok(ChangeSet::AllChanged);
        }

        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("failed to resolve workspace root {}", self.root.display()))?;
        let repo = GitRepo::discover(&root).map_err(CiJobsError::from)?;
        let repo_root = repo.path().canonicalize()?;

        // Diff paths are relative to the repository, project paths to the workspace
        let base = root.strip_prefix(&repo_root).map_err(|_| {
            CiJobsError::other(format!(
                "workspace root {} is outside the git repository at {}",
                root.display(),
                repo_root.display()
            ))
        })?;
        debug!(base = %base.display(), "workspace location inside repository");

        let filter = self
            .config
            .change_filter()
            .map_err(|err| located(err.into(), &self.config_path))?;

        let changes = ChangeDetector::new()
            .with_root(repo.path())
            .with_base(base)
            .with_filter(filter)
            .detect_changes(&self.graph, base_ref, &repo)
            .map_err(|err| {
                if err.is_configuration() {
                    located(err, &self.config_path)
                } else {
                    anyhow::Error::new(err)
                        .context(format!("failed to detect changes since '{}'", base_ref))
                }
            })?;
        Ok(changes)
    }

    /// Projects affected by the changes since `base_ref`
    pub fn affected(&self, base_ref: &str, chatty: bool) -> anyhow::Result<AffectedSet> {
        let changes = self.changes(base_ref, chatty)?;
        let affected = expand(&self.graph, &changes).map_err(CiJobsError::from)?;
        info!(affected = affected.len(), "expanded affected projects");
        Ok(affected)
    }
}
