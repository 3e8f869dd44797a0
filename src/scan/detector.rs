//! Decides which app artifacts a product manifest is missing.
use crate::{meta::ArtifactRecord, scan::product::ProductModel};

pub const APP_SUFFIX: &str = "-app";
pub const DEMO_APP_SUFFIX: &str = "-demo-app";
const DEMO_SUFFIXES: &[&str] = &["-demo", "-demos"];

/// Kind of downstream app artifact a product can ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    App,
    DemoApp,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 2] = [ArtifactRole::App, ArtifactRole::DemoApp];

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::App => APP_SUFFIX,
            Self::DemoApp => DEMO_APP_SUFFIX,
        }
    }

    /// `foo` → `foo-app` / `foo-demo-app`
    pub fn artifact_id(&self, product_id: &str) -> String {
        format!("{product_id}{}", self.suffix())
    }

    pub fn display_name(&self, product_name: &str) -> String {
        match self {
            Self::App => format!("{product_name} App"),
            Self::DemoApp => format!("{product_name} Demo App"),
        }
    }

    /// Whether a module belongs in this role's app project.
    pub fn includes_module(&self, artifact_id: &str) -> bool {
        match self {
            Self::App => !is_app(artifact_id) && !is_demo(artifact_id),
            Self::DemoApp => !is_app(artifact_id),
        }
    }
}

pub fn is_demo(artifact_id: &str) -> bool {
    DEMO_SUFFIXES.iter().any(|suffix| artifact_id.ends_with(suffix))
}

pub fn is_app(artifact_id: &str) -> bool {
    artifact_id.ends_with(APP_SUFFIX)
}

/// True when no record declares `key == product_id` and
/// `artifactId == product_id + suffix`.
pub fn is_missing(
    product_id: &str,
    artifacts: &[ArtifactRecord],
    role: ArtifactRole,
) -> bool {
    let expected = role.artifact_id(product_id);

    !artifacts.iter().any(|record| {
        record.key.as_deref() == Some(product_id)
            && record.artifact_id.as_deref() == Some(expected.as_str())
    })
}

/// Whether the product's modules give `role` anything to package.
pub fn role_applies(role: ArtifactRole, model: &ProductModel) -> bool {
    match role {
        ArtifactRole::App => model.modules.iter().any(|module| {
            module.artifact_id != model.parent.artifact_id
                && role.includes_module(&module.artifact_id)
        }),
        ArtifactRole::DemoApp => model.artifact_ids().any(is_demo),
    }
}

/// Roles that apply to the product but have no matching record.
pub fn missing_roles(
    product_id: &str,
    artifacts: &[ArtifactRecord],
    model: &ProductModel,
) -> Vec<ArtifactRole> {
    ArtifactRole::ALL
        .into_iter()
        .filter(|role| role_applies(*role, model))
        .filter(|role| is_missing(product_id, artifacts, *role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::product_model;

    fn record(key: &str, artifact_id: &str) -> ArtifactRecord {
        ArtifactRecord {
            key: Some(key.into()),
            artifact_id: Some(artifact_id.into()),
            ..ArtifactRecord::default()
        }
    }

    #[test]
    fn no_records_means_missing() {
        assert!(is_missing("foo", &[], ArtifactRole::App));
        assert!(is_missing("foo", &[], ArtifactRole::DemoApp));
    }

    #[test]
    fn matching_record_is_present() {
        let artifacts = vec![record("foo", "foo"), record("foo", "foo-app")];

        assert!(!is_missing("foo", &artifacts, ArtifactRole::App));
        assert!(is_missing("foo", &artifacts, ArtifactRole::DemoApp));
    }

    #[test]
    fn key_must_match_product() {
        let artifacts = vec![record("bar", "foo-app")];
        assert!(is_missing("foo", &artifacts, ArtifactRole::App));
    }

    #[test]
    fn demo_role_needs_demo_module() {
        let plain = product_model(&["foo-core"]);
        let with_demo = product_model(&["foo-core", "foo-demo"]);

        assert!(!role_applies(ArtifactRole::DemoApp, &plain));
        assert!(role_applies(ArtifactRole::DemoApp, &with_demo));
    }

    #[test]
    fn app_role_needs_packageable_module() {
        assert!(role_applies(ArtifactRole::App, &product_model(&["foo-core"])));
        assert!(!role_applies(ArtifactRole::App, &product_model(&["foo-demo"])));
        assert!(!role_applies(ArtifactRole::App, &product_model(&["foo-app"])));
        assert!(!role_applies(ArtifactRole::App, &product_model(&[])));
    }

    #[test]
    fn lists_missing_roles() {
        let model = product_model(&["foo-core", "foo-demo"]);

        assert_eq!(
            missing_roles("foo", &[record("foo", "foo")], &model),
            vec![ArtifactRole::App, ArtifactRole::DemoApp]
        );
        assert_eq!(
            missing_roles("foo", &[record("foo", "foo-app")], &model),
            vec![ArtifactRole::DemoApp]
        );
    }

    #[test]
    fn role_naming() {
        assert_eq!(ArtifactRole::App.artifact_id("foo"), "foo-app");
        assert_eq!(ArtifactRole::DemoApp.artifact_id("foo"), "foo-demo-app");
        assert_eq!(ArtifactRole::DemoApp.display_name("Foo"), "Foo Demo App");
        assert!(ArtifactRole::DemoApp.includes_module("foo-demo"));
        assert!(!ArtifactRole::App.includes_module("foo-demos"));
    }
}
