//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => "YAML",
        _ => "TOML",
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(
        path = %path.display(),
        projects = config.projects.len(),
        "config loaded and validated"
    );
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `ci-jobs.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/ci-jobs.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Directory project paths in `config_path` are relative to.
///
/// This is the directory holding the file, or the one above it for files
/// kept in `.github/`.
pub fn workspace_root(config_path: &Path) -> PathBuf {
    let dir = match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    if dir.file_name().is_some_and(|name| name == ".github") {
        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            return parent.to_path_buf();
        }
        return PathBuf::from(".");
    }
    dir.to_path_buf()
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CiJobsError;
    use tempfile::TempDir;

    const MINIMAL: &str = "[[projects]]\nname = \"core\"\npath = \"packages/core\"\n";

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-jobs.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("ci-jobs.toml");
        let yaml_path = temp.path().join("ci-jobs.yaml");
        std::fs::write(&toml_path, MINIMAL).unwrap();
        std::fs::write(&yaml_path, "projects: []\n").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, toml_path);
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("ci-jobs.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-jobs.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();
        let nested = temp.path().join("packages").join("core");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_workspace_root() {
        assert_eq!(
            workspace_root(Path::new("/repo/monorepo/ci-jobs.toml")),
            PathBuf::from("/repo/monorepo")
        );
        assert_eq!(
            workspace_root(Path::new("/repo/.github/ci-jobs.yaml")),
            PathBuf::from("/repo")
        );
        assert_eq!(workspace_root(Path::new(".github/ci-jobs.toml")), PathBuf::from("."));
        assert_eq!(workspace_root(Path::new("ci-jobs.toml")), PathBuf::from("."));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-jobs.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.projects[0].name, "core");
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-jobs.yaml");
        std::fs::write(
            &config_path,
            "test_types: [unit]\nprojects:\n  - name: core\n    path: packages/core\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.projects[0].path, PathBuf::from("packages/core"));
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-jobs.toml");
        std::fs::write(&config_path, "[[projects]]\nname = \"\"\npath = \"x\"\n").unwrap();

        let err = load_config(&config_path).unwrap_err();
        assert!(matches!(err, CiJobsError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_config_from_dir_missing() {
        let temp = TempDir::new().unwrap();
        let err = load_config_from_dir(temp.path());
        assert!(err.is_err());
    }
}
