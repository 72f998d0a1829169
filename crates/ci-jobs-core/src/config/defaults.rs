//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "ci-jobs.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "ci-jobs.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".ci-jobs.toml",
        ".ci-jobs.yaml",
    ]
}

/// Starter configuration written by `ci-jobs init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ci-jobs configuration
#
# Command templates may use {baseRef} and {event}, plus any --var passed
# on the command line.

test_types = ["unit", "e2e"]

# Changed files matching these globs never trigger jobs
ignore = ["**/*.md"]

[[projects]]
name = "core"
path = "packages/core"

[projects.lint]
command = "pnpm --filter=core lint"

[[projects.tests.unit]]
name = "Core unit tests"
command = "pnpm --filter=core test --base-ref={baseRef}"

[[projects]]
name = "app"
path = "apps/app"
dependencies = ["core"]

[projects.lint]
command = "pnpm --filter=app lint"
events = ["pull_request"]

[[projects.tests.e2e]]
name = "App e2e"
command = "pnpm --filter=app test:e2e"
optional = true
shards = ["--shard=1/2", "--shard=2/2"]

[projects.tests.e2e.test_env]
start = "pnpm --filter=app env:start"
"#;
