//! GitHub Actions step outputs

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ci_jobs_core::{JobCategory, JobSet};

/// Path of the step output file when running inside GitHub Actions
pub fn github_output_path() -> Option<PathBuf> {
    resolve_output_path(
        std::env::var("GITHUB_ACTIONS").ok().as_deref(),
        std::env::var("GITHUB_OUTPUT").ok().as_deref(),
    )
}

fn resolve_output_path(actions: Option<&str>, output: Option<&str>) -> Option<PathBuf> {
    match (actions, output) {
        (Some("true"), Some(path)) if !path.trim().is_empty() => Some(PathBuf::from(path)),
        _ => None,
    }
}

/// Output name for a job category list
fn output_name(category: &JobCategory) -> String {
    match category {
        JobCategory::Lint => "lint-jobs".to_string(),
        JobCategory::Test(test_type) => format!("{}-test-jobs", test_type),
    }
}

/// `name=<json>` pairs, lint first then test types in order
fn outputs(jobs: &JobSet) -> anyhow::Result<Vec<(String, String)>> {
    jobs.categories()
        .map(|(category, list)| -> anyhow::Result<(String, String)> {
            Ok((
                output_name(&category),
                serde_json::to_string(list)?,
            ))
        })
        .collect()
}

/// Append one output line per job category to the step output file.
///
/// Returns the output names written.
pub fn write_github_outputs(path: &Path, jobs: &JobSet) -> anyhow::Result<Vec<String>> {
    let outputs = outputs(jobs)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (name, value) in &outputs {
        debug!(output = %name, bytes = value.len(), "writing step output");
        writeln!(file, "{}={}", name, value)?;
    }

    info!(path = %path.display(), outputs = outputs.len(), "wrote GitHub step outputs");
    Ok(outputs.into_iter().map(|(name, _)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci_jobs_core::Job;
    use tempfile::TempDir;

    fn job(project: &str, category: JobCategory, command: &str) -> Job {
        Job {
            project_name: project.to_string(),
            name: category.to_string(),
            category,
            command: command.to_string(),
            optional: false,
            shard: None,
            test_env: None,
        }
    }

    #[test]
    fn test_resolve_output_path() {
        assert_eq!(
            resolve_output_path(Some("true"), Some("/tmp/out")),
            Some(PathBuf::from("/tmp/out"))
        );
        assert_eq!(resolve_output_path(None, Some("/tmp/out")), None);
        assert_eq!(resolve_output_path(Some("false"), Some("/tmp/out")), None);
        assert_eq!(resolve_output_path(Some("true"), Some("")), None);
        assert_eq!(resolve_output_path(Some("true"), None), None);
    }

    #[test]
    fn test_output_names() {
        assert_eq!(output_name(&JobCategory::Lint), "lint-jobs");
        assert_eq!(output_name(&JobCategory::Test("e2e".to_string())), "e2e-test-jobs");
        assert_eq!(output_name(&JobCategory::Test("lint".to_string())), "lint-test-jobs");
    }

    #[test]
    fn test_write_outputs_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("github_output");
        std::fs::write(&path, "existing=1\n").unwrap();

        let mut jobs = JobSet::default();
        jobs.lint.push(job("core", JobCategory::Lint, "lint core"));
        jobs.test.insert("unit".to_string(), Vec::new());

        let names = write_github_outputs(&path, &jobs).unwrap();
        assert_eq!(names, vec!["lint-jobs", "unit-test-jobs"]);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing=1");
        assert_eq!(lines[2], "unit-test-jobs=[]");

        let lint_json = lines[1].strip_prefix("lint-jobs=").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(lint_json).unwrap();
        assert_eq!(parsed[0]["projectName"], "core");
        assert_eq!(parsed[0]["command"], "lint core");
        assert_eq!(parsed[0]["category"], "lint");
    }
}
