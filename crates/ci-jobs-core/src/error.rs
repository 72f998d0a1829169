//! Error types for ci-jobs

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using CiJobsError
pub type Result<T> = std::result::Result<T, CiJobsError>;

/// Main error type for ci-jobs operations
#[derive(Debug, Error)]
pub enum CiJobsError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Project graph errors
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Change detection errors
    #[error(transparent)]
    Change(#[from] ChangeError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building or querying the project graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Two projects share a name
    #[error("Duplicate project name: {0}")]
    DuplicateProject(String),

    /// A dependency names a project that was never declared
    #[error("Project '{project}' depends on unknown project '{dependency}'")]
    DanglingDependency { project: String, dependency: String },

    /// The dependency relation contains a cycle
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Lookup of an unknown project
    #[error("Project not found: {0}")]
    NotFound(String),
}

/// Errors raised while attributing changed files to projects
#[derive(Debug, Error)]
pub enum ChangeError {
    /// Two project paths overlap so file ownership is ambiguous
    #[error("Ambiguous ownership: '{first}' ({first_path}) and '{second}' ({second_path}) overlap")]
    AmbiguousOwnership {
        first: String,
        first_path: PathBuf,
        second: String,
        second_path: PathBuf,
    },

    /// Change detection requires a base ref
    #[error("A base ref is required for change detection")]
    MissingBaseRef,

    /// The diff collaborator failed
    #[error("Failed to diff against '{base_ref}': {reason}")]
    DiffFailed { base_ref: String, reason: String },
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Reference could not be resolved
    #[error("Git reference not found: {0}")]
    RefNotFound(String),

    /// Repository has no working directory to compare against
    #[error("Repository at {0} is bare")]
    BareRepository(PathBuf),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

impl CiJobsError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error stems from the workspace configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Graph(_)
                | Self::Change(ChangeError::AmbiguousOwnership { .. })
        )
    }
}
