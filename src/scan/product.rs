//! Module structure of a product's source repository.
use log::*;

use crate::{
    Result, StewardError,
    forge::{
        config::RepoName, manager::ForgeManager,
        request::GetFileContentRequest,
    },
    maven::pom::{POM, Pom},
};

const TEST_SUFFIXES: &[&str] = &["-test", "-tests"];
pub const PRODUCT_SUFFIX: &str = "-product";

/// Parent POM of a product plus the internal modules it aggregates.
#[derive(Debug, Clone)]
pub struct ProductModel {
    pub repo: RepoName,
    pub parent: Pom,
    /// Raw parent `pom.xml`, kept for byte-preserving edits.
    pub parent_xml: String,
    pub parent_sha: String,
    /// Internal modules in declaration order.
    pub modules: Vec<Pom>,
}

fn is_support_module(name: &str) -> bool {
    name.ends_with(PRODUCT_SUFFIX)
        || TEST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

impl ProductModel {
    /// Reads the root `pom.xml` of `repo` and every internal module it
    /// lists. Test and product packaging modules are skipped, as are
    /// modules without a readable `pom.xml`.
    pub async fn load(forge: &ForgeManager, repo: &RepoName) -> Result<Self> {
        let root = forge
            .get_file_content(GetFileContentRequest {
                repo: repo.clone(),
                path: POM.to_string(),
                branch: None,
            })
            .await?
            .ok_or_else(|| {
                StewardError::invalid_descriptor(
                    format!("{repo}/{POM}"),
                    "parent descriptor not found",
                )
            })?;

        let parent = Pom::parse(&format!("{repo}/{POM}"), &root.content)?;

        let mut modules = vec![];

        for module in &parent.modules {
            let module = parent.resolve(module);

            if module.trim().is_empty() {
                continue;
            }

            if is_support_module(&module) {
                debug!("skipping support module {module} of {repo}");
                continue;
            }

            let path = format!("{module}/{POM}");
            let file = forge
                .get_file_content(GetFileContentRequest {
                    repo: repo.clone(),
                    path: path.clone(),
                    branch: None,
                })
                .await?;

            let Some(file) = file else {
                warn!("no {path} in {repo}: skipping module");
                continue;
            };

            let pom = Pom::parse(&format!("{repo}/{path}"), &file.content)?;

            if pom.is_iar_module() {
                modules.push(pom);
            } else {
                debug!("{module} of {repo} is not an iar module");
            }
        }

        info!(
            "{repo}: {} with {} internal modules",
            parent.artifact_id,
            modules.len()
        );

        Ok(Self {
            repo: repo.clone(),
            parent,
            parent_xml: root.content,
            parent_sha: root.sha,
            modules,
        })
    }

    /// Artifact ids of the parent and every internal module.
    pub fn artifact_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.parent.artifact_id.as_str())
            .chain(self.modules.iter().map(|m| m.artifact_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forge::{manager::ForgeOptions, traits::MockForge},
        test_helpers::{file, module_pom, parent_pom},
    };

    #[tokio::test]
    async fn loads_internal_modules() {
        let mut mock_forge = MockForge::new();
        mock_forge.expect_get_file_content().returning(|req| {
            Ok(match req.path.as_str() {
                "pom.xml" => Some(file(
                    "pom.xml",
                    &parent_pom(&["foo-core", "foo-lib", "foo-test", "foo-product", "gone"]),
                )),
                "foo-core/pom.xml" => Some(file("foo-core/pom.xml", &module_pom("foo-core", true))),
                "foo-lib/pom.xml" => Some(file("foo-lib/pom.xml", &module_pom("foo-lib", false))),
                _ => None,
            })
        });

        let forge = ForgeManager::new(Box::new(mock_forge), ForgeOptions::default());
        let repo = RepoName::new("axonivy-market", "foo-connector");

        let model = ProductModel::load(&forge, &repo).await.unwrap();

        assert_eq!(model.parent.artifact_id, "foo-modules");
        assert_eq!(
            model.artifact_ids().collect::<Vec<_>>(),
            vec!["foo-modules", "foo-core"]
        );
    }

    #[tokio::test]
    async fn missing_parent_is_an_error() {
        let mut mock_forge = MockForge::new();
        mock_forge.expect_get_file_content().returning(|_| Ok(None));

        let forge = ForgeManager::new(Box::new(mock_forge), ForgeOptions::default());
        let repo = RepoName::new("axonivy-market", "foo-connector");

        let result = ProductModel::load(&forge, &repo).await;

        assert!(matches!(result, Err(StewardError::InvalidDescriptor { .. })));
    }

    #[test]
    fn recognizes_support_modules() {
        assert!(is_support_module("foo-product"));
        assert!(is_support_module("foo-test"));
        assert!(is_support_module("foo-tests"));
        assert!(!is_support_module("foo-demo"));
    }
}
