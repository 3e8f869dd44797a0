//! `${...}` placeholder handling for POM values.
use regex::Regex;
use std::sync::LazyLock;

use crate::maven::pom::Pom;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

const PLACEHOLDER_START: &str = "${";
const PLACEHOLDER_END: char = '}';

fn lookup<'a>(pom: &'a Pom, key: &str) -> Option<&'a str> {
    if let Some(value) = pom.properties.get(key) {
        return Some(value);
    }

    match key {
        "project.name" => pom.name.as_deref(),
        "project.version" => pom.version(),
        "project.groupId" => pom.group_id(),
        "project.artifactId" => Some(pom.artifact_id.as_str()),
        _ => None,
    }
}

/// Replaces every known `${key}` in `value`. Unknown keys are left as is.
pub fn resolve_placeholders(pom: &Pom, value: &str) -> String {
    PLACEHOLDER
        .replace_all(value, |caps: &regex::Captures| {
            lookup(pom, &caps[1])
                .map(str::to_string)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Name of the module entry to append for a new project. When the existing
/// modules are named through a `${...}` prefix, the prefix is reused.
pub fn resolve_new_module_name(
    modules: &[String],
    suffix: &str,
    default_name: &str,
) -> String {
    modules
        .iter()
        .find(|m| m.starts_with(PLACEHOLDER_START))
        .and_then(|m| m.find(PLACEHOLDER_END).map(|end| &m[..=end]))
        .map(|prefix| format!("{prefix}{suffix}"))
        .unwrap_or_else(|| default_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pom() -> Pom {
        Pom {
            group_id: Some("com.axonivy.market".into()),
            artifact_id: "foo-modules".into(),
            version: Some("10.0.4".into()),
            name: Some("Foo".into()),
            properties: BTreeMap::from([(
                "module.prefix".to_string(),
                "foo".to_string(),
            )]),
            ..Pom::default()
        }
    }

    #[test]
    fn resolves_properties_and_project_fields() {
        let pom = pom();
        assert_eq!(resolve_placeholders(&pom, "${module.prefix}-product"), "foo-product");
        assert_eq!(
            resolve_placeholders(&pom, "${project.groupId}:${project.version}"),
            "com.axonivy.market:10.0.4"
        );
    }

    #[test]
    fn leaves_unknown_placeholders() {
        assert_eq!(resolve_placeholders(&pom(), "${unknown}-x"), "${unknown}-x");
        assert_eq!(resolve_placeholders(&pom(), "plain"), "plain");
    }

    #[test]
    fn reuses_placeholder_prefix_for_new_module() {
        let modules = vec!["${module.prefix}-core".to_string(), "other-app".to_string()];
        assert_eq!(
            resolve_new_module_name(&modules, "-app", "foo-app"),
            "${module.prefix}-app"
        );
    }

    #[test]
    fn falls_back_to_default_module_name() {
        let modules = vec!["foo".to_string(), "foo-demo".to_string()];
        assert_eq!(
            resolve_new_module_name(&modules, "-demo-app", "foo-demo-app"),
            "foo-demo-app"
        );
    }
}
