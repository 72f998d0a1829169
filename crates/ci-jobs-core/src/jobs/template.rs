//! Command template rendering

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::ConfigError;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.-]*)\}").expect("placeholder pattern is valid")
    })
}

/// Replace `{name}` placeholders with values from `vars`.
///
/// Unknown placeholders are kept verbatim. Substituted values are not scanned
/// again, so a value containing braces is inserted literally.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    if vars.is_empty() {
        return template.to_string();
    }

    placeholder()
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Reject variables whose value references another variable.
///
/// With such values ruled out, rendering an already rendered template
/// changes nothing.
pub fn validate_vars(vars: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    for (name, value) in vars {
        if let Some(nested) = placeholders(value).into_iter().find(|p| vars.contains_key(*p)) {
            return Err(ConfigError::InvalidValue {
                field: format!("vars.{}", name),
                message: format!("value references the variable '{{{}}}'", nested),
            });
        }
    }
    Ok(())
}

/// Names of all placeholders referenced by a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    placeholder()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
