//! Exit codes for the CLI

use ci_jobs_core::{ChangeError, CiJobsError, ConfigError, GitError, GraphError};

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Git error
pub const GIT_ERROR: i32 = 3;

/// Project graph error
pub const GRAPH_ERROR: i32 = 6;

/// Change detection error
pub const CHANGE_ERROR: i32 = 7;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<CiJobsError>() {
        return match err {
            CiJobsError::Config(_) => CONFIG_ERROR,
            CiJobsError::Graph(_) => GRAPH_ERROR,
            CiJobsError::Change(_) => CHANGE_ERROR,
            CiJobsError::Git(_) => GIT_ERROR,
            CiJobsError::Io(_) | CiJobsError::Json(_) | CiJobsError::Other(_) => ERROR,
        };
    }

    if err.is::<ConfigError>() {
        CONFIG_ERROR
    } else if err.is::<GraphError>() {
        GRAPH_ERROR
    } else if err.is::<ChangeError>() {
        CHANGE_ERROR
    } else if err.is::<GitError>() {
        GIT_ERROR
    } else {
        ERROR
    }
}
