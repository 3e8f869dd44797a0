//! Builds the manifest record and the new project for a missing role.
use crate::{
    Result, StewardError,
    maven::{
        property::resolve_new_module_name,
        template::{
            AppPomContext, AppProject, DependencyContext, ScmContext, Templates,
        },
    },
    meta::{ArtifactRecord, DEFAULT_ARTIFACT_TYPE},
    scan::{detector::ArtifactRole, product::ProductModel},
};

/// Everything needed to add one role to a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub role: ArtifactRole,
    pub record: ArtifactRecord,
    pub project: AppProject,
    /// Entry to append to the parent's `<modules>`.
    pub module_name: String,
}

pub fn synthesize(
    role: ArtifactRole,
    product_id: &str,
    product_name: &str,
    model: &ProductModel,
    templates: &Templates,
) -> Result<Synthesis> {
    let parent = &model.parent;
    let group_id = parent.group_id().ok_or_else(|| {
        StewardError::invalid_descriptor(
            format!("{}/pom.xml", model.repo),
            "parent has no groupId",
        )
    })?;

    let artifact_id = role.artifact_id(product_id);

    let record = ArtifactRecord {
        key: Some(product_id.to_string()),
        name: Some(role.display_name(product_name)),
        group_id: Some(group_id.to_string()),
        artifact_id: Some(artifact_id.clone()),
        artifact_type: Some(DEFAULT_ARTIFACT_TYPE.to_string()),
    };

    let dependencies = model
        .modules
        .iter()
        .filter(|module| role.includes_module(&module.artifact_id))
        .map(|module| DependencyContext {
            group_id: module
                .group_id()
                .map(|g| module.resolve(g))
                .unwrap_or_else(|| group_id.to_string()),
            artifact_id: module.artifact_id.clone(),
            version: module.version().map(|v| module.resolve(v)),
        })
        .collect();

    let context = AppPomContext {
        group_id: group_id.to_string(),
        artifact_id: artifact_id.clone(),
        version: parent.version().map(str::to_string),
        name: parent.name.clone(),
        scm: parent.scm.as_ref().map(|scm| ScmContext {
            url: scm.url.clone(),
            connection: scm.connection.clone(),
            developer_connection: scm.developer_connection.clone(),
            tag: scm.tag.clone(),
        }),
        dependencies,
    };

    let project = templates.render_project(artifact_id.clone(), &context)?;

    let module_name =
        resolve_new_module_name(&parent.modules, role.suffix(), &artifact_id);

    Ok(Synthesis {
        role,
        record,
        project,
        module_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{maven::pom::Pom, test_helpers::product_model};

    #[test]
    fn synthesizes_app_role() {
        let model = product_model(&["foo-core", "foo-demo"]);
        let templates = Templates::bundled().unwrap();

        let synthesis =
            synthesize(ArtifactRole::App, "foo", "Foo", &model, &templates).unwrap();

        assert_eq!(
            synthesis.record,
            ArtifactRecord {
                key: Some("foo".into()),
                name: Some("Foo App".into()),
                group_id: Some("com.axonivy.connector.foo".into()),
                artifact_id: Some("foo-app".into()),
                artifact_type: Some("zip".into()),
            }
        );
        assert_eq!(synthesis.project.folder, "foo-app");
        assert_eq!(synthesis.module_name, "foo-app");

        let pom = Pom::parse("foo-app/pom.xml", &synthesis.project.pom).unwrap();
        let deps: Vec<&str> =
            pom.dependencies.iter().map(|d| d.artifact_id.as_str()).collect();
        assert_eq!(deps, vec!["foo-core"]);
        assert_eq!(pom.version(), Some("12.0.0"));
    }

    #[test]
    fn demo_role_includes_demo_modules() {
        let model = product_model(&["foo-core", "foo-demo"]);
        let templates = Templates::bundled().unwrap();

        let synthesis =
            synthesize(ArtifactRole::DemoApp, "foo", "Foo", &model, &templates)
                .unwrap();

        assert_eq!(synthesis.record.name.as_deref(), Some("Foo Demo App"));
        assert_eq!(synthesis.project.folder, "foo-demo-app");

        let pom = Pom::parse("pom.xml", &synthesis.project.pom).unwrap();
        let deps: Vec<&str> =
            pom.dependencies.iter().map(|d| d.artifact_id.as_str()).collect();
        assert_eq!(deps, vec!["foo-core", "foo-demo"]);
    }

    #[test]
    fn reuses_placeholder_module_prefix() {
        let mut model = product_model(&["foo-core"]);
        model.parent.modules = vec!["${module.prefix}-core".into()];

        let synthesis = synthesize(
            ArtifactRole::App,
            "foo",
            "Foo",
            &model,
            &Templates::bundled().unwrap(),
        )
        .unwrap();

        assert_eq!(synthesis.module_name, "${module.prefix}-app");
    }
}
