//! Publishes app artifacts that are missing for released product versions.
//!
//! Works on a local checkout of the product repository: the root `pom.xml`
//! (or one level below it) declares a `-product` module whose published
//! versions drive the release. Every `-app` / `-demo-app` module of the same
//! POM without published metadata is rebuilt and deployed once per major
//! version line.
use log::*;
use std::path::{Path, PathBuf};

use crate::{
    Result, StewardError,
    config::RunConfig,
    forge::config::RepoName,
    maven::{
        build::{BuildTool, DeployRequest},
        edit::{set_internal_dependency_versions, set_project_version},
        metadata::{MetadataSource, metadata_url, published_versions, unify_versions},
        pom::{POM, Pom},
    },
    scan::{detector::APP_SUFFIX, product::PRODUCT_SUFFIX},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// First non-zero status observed
    pub status: i32,
    /// App modules without published metadata
    pub missing_apps: Vec<String>,
    /// `module@version` of every successful deploy
    pub deployed: Vec<String>,
}

impl PublishReport {
    fn fail(&mut self, code: i32) {
        if self.status == 0 {
            self.status = code;
        }
    }
}

pub struct AppPublisher<'a> {
    config: &'a RunConfig,
    metadata: &'a dyn MetadataSource,
    build: &'a dyn BuildTool,
}

fn product_module(pom: &Pom) -> Option<&str> {
    pom.modules
        .iter()
        .map(String::as_str)
        .find(|m| m.ends_with(PRODUCT_SUFFIX))
}

fn app_modules(pom: &Pom) -> Vec<String> {
    let mut apps: Vec<String> = vec![];

    for module in &pom.modules {
        let module = pom.resolve(module);
        if module.ends_with(APP_SUFFIX) && !apps.contains(&module) {
            apps.push(module);
        }
    }

    apps
}

impl<'a> AppPublisher<'a> {
    pub fn new(
        config: &'a RunConfig,
        metadata: &'a dyn MetadataSource,
        build: &'a dyn BuildTool,
    ) -> Self {
        Self {
            config,
            metadata,
            build,
        }
    }

    pub async fn publish(
        &self,
        checkout: &Path,
        repo: &RepoName,
    ) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        let Some(root) = read_pom(checkout, &mut report).await? else {
            error!("{} is not a Maven project", checkout.display());
            report.fail(1);
            return Ok(report);
        };

        let mut targets: Vec<(PathBuf, Pom, String)> = vec![];

        if let Some(product) = product_module(&root) {
            targets.push((checkout.to_path_buf(), root.clone(), product.to_string()));
        } else {
            // aggregating repositories keep products one level down
            for module in &root.modules {
                let module = root.resolve(module);

                if module.trim().is_empty() {
                    continue;
                }

                let dir = checkout.join(&module);

                let Some(pom) = read_pom(&dir, &mut report).await? else {
                    info!("no {POM} at {module}");
                    continue;
                };

                if let Some(product) = product_module(&pom) {
                    let product = product.to_string();
                    targets.push((dir, pom, product));
                }
            }
        }

        if targets.is_empty() {
            info!("no product module found in {repo}");
        }

        for (dir, pom, product) in targets {
            match self.release_for_pom(&dir, &pom, &product, repo, &mut report).await {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!("failed to release apps of {}: {err}", pom.artifact_id);
                    report.fail(1);
                }
            }
        }

        Ok(report)
    }

    async fn release_for_pom(
        &self,
        dir: &Path,
        pom: &Pom,
        product: &str,
        repo: &RepoName,
        report: &mut PublishReport,
    ) -> Result<()> {
        let product = pom.resolve(product);
        let group_id = pom.group_id().ok_or_else(|| {
            StewardError::invalid_descriptor(
                dir.join(POM).display().to_string(),
                "missing groupId",
            )
        })?;

        let url = metadata_url(&self.config.maven_base_url, group_id, &product)?;
        let versions = published_versions(self.metadata, url).await?;

        if versions.is_empty() {
            info!("there is no {product} version available on maven repo");
            report.fail(1);
            return Ok(());
        }

        let versions =
            unify_versions(&versions, self.config.version_range.as_ref());

        if versions.is_empty() {
            info!("no {product} version needs to be adapted");
            return Ok(());
        }

        for app in app_modules(pom) {
            let url = metadata_url(&self.config.maven_base_url, group_id, &app)?;
            let published = match self.metadata.fetch(url).await {
                Ok(body) => body.is_some_and(|body| !body.trim().is_empty()),
                Err(err) => {
                    error!("cannot look up published {app} artifacts: {err}");
                    report.fail(1);
                    continue;
                }
            };

            if published {
                debug!("{app} is already published");
                continue;
            }

            info!("no {app} artifact available on maven repo");
            report.missing_apps.push(app.clone());

            if self.config.dry_run {
                warn!(
                    "dry_run: would deploy {app} with version(s) {}",
                    versions.join(", ")
                );
                report.fail(1);
                continue;
            }

            info!("deploying {app} with version(s) {}", versions.join(", "));
            self.deploy_versions(dir, &app, &versions, repo, report).await;
        }

        Ok(())
    }

    async fn deploy_versions(
        &self,
        dir: &Path,
        app: &str,
        versions: &[String],
        repo: &RepoName,
        report: &mut PublishReport,
    ) {
        for version in versions {
            info!("building {app} with version {version}");

            if let Err(err) = bump_versions(&dir.join(app), version).await {
                error!("cannot update the {POM} of {app}: {err}");
                report.fail(1);
                continue;
            }

            let result = self
                .build
                .deploy(DeployRequest {
                    project_dir: dir.to_path_buf(),
                    module: app.to_string(),
                    repo: repo.clone(),
                })
                .await;

            match result {
                Ok(0) => report.deployed.push(format!("{app}@{version}")),
                Ok(code) => {
                    error!("deploy of {app}@{version} exited with {code}");
                    report.fail(code);
                }
                Err(err) => {
                    error!("cannot deploy {app}@{version}: {err}");
                    report.fail(1);
                }
            }
        }
    }
}

/// `None` when the directory has no `pom.xml` or it cannot be parsed.
async fn read_pom(dir: &Path, report: &mut PublishReport) -> Result<Option<Pom>> {
    let path = dir.join(POM);

    if !tokio::fs::try_exists(&path).await? {
        return Ok(None);
    }

    let content = tokio::fs::read_to_string(&path).await?;

    match Pom::parse(&path.display().to_string(), &content) {
        Ok(pom) => Ok(Some(pom)),
        Err(err) => {
            error!("cannot read {}: {err}", path.display());
            report.fail(1);
            Ok(None)
        }
    }
}

/// Sets the module's version and the version of its internal `iar`
/// dependencies.
async fn bump_versions(module_dir: &Path, version: &str) -> Result<()> {
    let path = module_dir.join(POM);

    if !tokio::fs::try_exists(&path).await? {
        return Err(StewardError::invalid_descriptor(
            path.display().to_string(),
            "not found",
        ));
    }

    let content = tokio::fs::read_to_string(&path).await?;
    let content = set_project_version(&content, version)?;
    let content = set_internal_dependency_versions(&content, version)?;

    tokio::fs::write(&path, content).await?;

    Ok(())
}
