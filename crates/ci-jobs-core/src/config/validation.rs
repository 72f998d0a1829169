//! Configuration validation

use std::collections::HashSet;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::monorepo::project::{JobDefinition, Project};

use super::types::Config;

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate configuration.
///
/// Structural problems of the dependency graph (unknown dependencies,
/// cycles, overlapping paths) are reported when the graph is used.
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_test_types(config)?;
    config.change_filter()?;
    validate_projects(config)?;
    debug!("configuration validation passed");
    Ok(())
}

/// Test types become CI output names, so keep them to a safe alphabet
fn is_valid_test_type(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_test_types(config: &Config) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, test_type) in config.test_types.iter().enumerate() {
        if !is_valid_test_type(test_type) {
            return Err(invalid(
                format!("test_types[{}]", i),
                "must be non-empty and contain only letters, digits, '-' or '_'",
            )
            .into());
        }
        if !seen.insert(test_type) {
            return Err(invalid(format!("test_types[{}]", i), format!("duplicate test type '{}'", test_type)).into());
        }
    }
    Ok(())
}

fn validate_projects(config: &Config) -> Result<()> {
    if !config.projects.is_empty() {
        debug!(count = config.projects.len(), "validating projects");
    }
    for (i, project) in config.projects.iter().enumerate() {
        validate_project(&format!("projects[{}]", i), project)?;
    }
    Ok(())
}

fn validate_project(field: &str, project: &Project) -> Result<()> {
    if project.name.trim().is_empty() {
        return Err(invalid(format!("{}.name", field), "project name cannot be empty").into());
    }

    if project.path.as_os_str().is_empty() {
        return Err(invalid(
            format!("{}.path", field),
            "path cannot be empty (use \".\" for the workspace root)",
        )
        .into());
    }

    if project.path.is_absolute() {
        return Err(invalid(format!("{}.path", field), "path must be relative to the workspace root").into());
    }

    if let Some(lint) = &project.lint {
        let lint_field = format!("{}.lint", field);
        validate_job(&lint_field, lint)?;
        if !lint.shards.is_empty() {
            return Err(invalid(lint_field, "lint jobs cannot be sharded").into());
        }
        if lint.test_env.is_some() {
            return Err(invalid(lint_field, "lint jobs cannot declare a test environment").into());
        }
    }

    for (test_type, jobs) in &project.tests {
        if !is_valid_test_type(test_type) {
            return Err(invalid(
                format!("{}.tests", field),
                format!("invalid test type '{}'", test_type),
            )
            .into());
        }
        for (j, job) in jobs.iter().enumerate() {
            validate_job(&format!("{}.tests.{}[{}]", field, test_type, j), job)?;
        }
    }

    Ok(())
}

fn validate_job(field: &str, job: &JobDefinition) -> Result<()> {
    if job.command.trim().is_empty() {
        return Err(invalid(format!("{}.command", field), "command cannot be empty").into());
    }

    if job.events.iter().any(|e| e.trim().is_empty()) {
        return Err(invalid(format!("{}.events", field), "event names cannot be empty").into());
    }

    let mut seen = HashSet::new();
    for shard in &job.shards {
        if shard.trim().is_empty() {
            return Err(invalid(format!("{}.shards", field), "shard arguments cannot be empty").into());
        }
        if !seen.insert(shard) {
            return Err(invalid(format!("{}.shards", field), format!("duplicate shard '{}'", shard)).into());
        }
    }

    if let Some(env) = &job.test_env {
        if env.start.trim().is_empty() {
            return Err(invalid(format!("{}.test_env.start", field), "start command cannot be empty").into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monorepo::project::TestEnvironment;

    fn config_with(project: Project) -> Config {
        Config {
            projects: vec![project],
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_invalid_test_type() {
        let mut config = Config::default();
        config.test_types = vec!["unit tests".to_string()];
        assert!(validate_config(&config).is_err());

        config.test_types = vec!["unit".to_string(), "unit".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_ignore_glob() {
        let mut config = Config::default();
        config.ignore = vec!["[".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_path() {
        assert!(validate_config(&config_with(Project::new("a", ""))).is_err());
        assert!(validate_config(&config_with(Project::new("a", "."))).is_ok());
    }

    #[test]
    fn test_validate_empty_command() {
        let project = Project::new("a", "a").with_test("unit", JobDefinition::new("  "));
        assert!(validate_config(&config_with(project)).is_err());
    }

    #[test]
    fn test_validate_sharded_lint() {
        let project = Project::new("a", "a").with_lint(JobDefinition::new("lint").with_shards(["1", "2"]));
        assert!(validate_config(&config_with(project)).is_err());
    }

    #[test]
    fn test_validate_duplicate_shards() {
        let project = Project::new("a", "a").with_test(
            "e2e",
            JobDefinition::new("test").with_shards(["--shard=1/2", "--shard=1/2"]),
        );
        assert!(validate_config(&config_with(project)).is_err());
    }

    #[test]
    fn test_validate_test_env() {
        let env = TestEnvironment {
            start: String::new(),
            config: Default::default(),
        };
        let project = Project::new("a", "a").with_test("e2e", JobDefinition::new("test").with_test_env(env));
        assert!(validate_config(&config_with(project)).is_err());
    }
}
