//! Reconciles the marketplace's `meta.json` manifests with the module
//! structure of each product's source repository.
use log::*;

use crate::{
    Result, StewardError,
    config::RunConfig,
    forge::{
        config::RepoName,
        manager::ForgeManager,
        request::{DirectoryRequest, EntryKind, FileChange, GetFileContentRequest},
        submission::{ChangeSubmission, PrDetails, PrOutcome, SubmitOutcome},
    },
    maven::{edit::append_module, pom::POM, template::Templates},
    meta::{META_JSON, ProductManifest},
    scan::{
        detector::missing_roles,
        product::ProductModel,
        synthesizer::{Synthesis, synthesize},
    },
};

pub const BRANCH_NAME: &str = "fix-missing-maven-artifacts";
pub const COMMIT_MESSAGE: &str =
    "Fix: Add missing Maven artifact blocks to meta.json files";
pub const UPDATE_POM_MODULE_MESSAGE: &str = "Update POM module";
pub const CREATED_NEW_FILE_MESSAGE: &str = "Created new file";
pub const PR_TITLE: &str = "Fix: Add missing Maven artifact blocks";
pub const PR_BODY: &str = "This PR adds missing Maven artifact blocks to all `meta.json` files in the repository.";

fn pr_details() -> PrDetails {
    PrDetails {
        title: PR_TITLE.to_string(),
        body: PR_BODY.to_string(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Manifests inspected
    pub manifests: usize,
    /// Products that were missing at least one app artifact
    pub changed: Vec<String>,
    /// Files left alone because they exist with other content
    pub conflicts: usize,
    /// Products or changes skipped because of an error
    pub failures: usize,
}

impl ScanReport {
    pub fn has_issues(&self) -> bool {
        !self.changed.is_empty() || self.conflicts > 0 || self.failures > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_issues() { 1 } else { 0 }
    }
}

pub struct MetaJsonScanner<'a> {
    forge: &'a ForgeManager,
    config: &'a RunConfig,
    templates: &'a Templates,
    market: RepoName,
}

impl<'a> MetaJsonScanner<'a> {
    pub fn new(
        forge: &'a ForgeManager,
        config: &'a RunConfig,
        templates: &'a Templates,
        market: RepoName,
    ) -> Self {
        Self {
            forge,
            config,
            templates,
            market,
        }
    }

    pub async fn scan(&self) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        let mut market = ChangeSubmission::new(
            self.forge,
            self.market.clone(),
            BRANCH_NAME,
            self.config.actor.clone(),
        );

        let manifests = self.find_manifests(&mut report).await?;
        info!("found {} manifests in {}", manifests.len(), self.market);

        for path in manifests {
            report.manifests += 1;

            match self.reconcile(&path, &mut market, &mut report).await {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!("failed to reconcile {path}: {err}");
                    report.failures += 1;
                }
            }
        }

        if let PrOutcome::Failed(_) = market.open_pr(pr_details()).await? {
            report.failures += 1;
        }

        info!(
            "scanned {} manifests: {} products changed, {} conflicts, {} failures",
            report.manifests,
            report.changed.len(),
            report.conflicts,
            report.failures
        );

        Ok(report)
    }

    /// Depth-first walk of the market folder, in listing order.
    async fn find_manifests(
        &self,
        report: &mut ScanReport,
    ) -> Result<Vec<String>> {
        let mut manifests = vec![];
        let mut pending = vec![self.config.market_folder.clone()];
        let mut is_root = true;

        while let Some(dir) = pending.pop() {
            let listing = self
                .forge
                .list_directory(DirectoryRequest {
                    repo: self.market.clone(),
                    path: dir.clone(),
                    branch: None,
                })
                .await;

            let entries = match listing {
                Ok(entries) => entries,
                Err(err) if is_root => return Err(err),
                Err(err) => {
                    error!("failed to list {dir}: {err}");
                    report.failures += 1;
                    continue;
                }
            };
            is_root = false;

            let mut subdirs = vec![];

            for entry in entries {
                if self.config.is_ignored(&entry.name) {
                    info!("ignoring {}", entry.path);
                    continue;
                }

                match entry.kind {
                    EntryKind::Dir => subdirs.push(entry.path),
                    EntryKind::File if entry.name == META_JSON => {
                        manifests.push(entry.path)
                    }
                    _ => {}
                }
            }

            pending.extend(subdirs.into_iter().rev());
        }

        Ok(manifests)
    }

    async fn reconcile(
        &self,
        path: &str,
        market: &mut ChangeSubmission<'a>,
        report: &mut ScanReport,
    ) -> Result<()> {
        let file = self
            .forge
            .get_file_content(GetFileContentRequest {
                repo: self.market.clone(),
                path: path.to_string(),
                branch: None,
            })
            .await?
            .ok_or_else(|| {
                StewardError::forge(format!("{path} not found in {}", self.market))
            })?;

        let mut manifest = ProductManifest::parse(path, &file.content)?;
        let artifacts = manifest.artifacts();

        if artifacts.is_empty() {
            info!("{path}: no maven artifacts declared: skipping");
            return Ok(());
        }

        let product_id = manifest
            .id()
            .ok_or_else(|| StewardError::invalid_descriptor(path, "missing id"))?
            .to_string();
        let product_name =
            manifest.name().unwrap_or(product_id.as_str()).to_string();

        let source: RepoName = manifest
            .source_repo()
            .ok_or_else(|| {
                StewardError::invalid_descriptor(
                    path,
                    "sourceUrl is not a GitHub repository",
                )
            })?
            .parse()?;

        if self.config.is_ignored(&source.name) {
            info!("{product_id}: source repository {source} is ignored");
            return Ok(());
        }

        let model = ProductModel::load(self.forge, &source).await?;
        let roles = missing_roles(&product_id, &artifacts, &model);

        if roles.is_empty() {
            info!("{product_id}: no changes were necessary");
            return Ok(());
        }

        warn!("{product_id}: missing app artifacts for {roles:?}");
        report.changed.push(product_id.clone());

        let syntheses = roles
            .into_iter()
            .map(|role| {
                synthesize(role, &product_id, &product_name, &model, self.templates)
            })
            .collect::<Result<Vec<_>>>()?;

        for synthesis in &syntheses {
            manifest.push_artifact(&synthesis.record)?;
        }

        self.submit_projects(&model, &syntheses, report).await?;

        let outcome = market
            .submit_file(FileChange {
                path: path.to_string(),
                content: manifest.to_pretty_string()?,
                message: COMMIT_MESSAGE.to_string(),
                force: true,
            })
            .await?;

        debug!("{path}: {outcome:?}");

        Ok(())
    }

    /// Commits the new project folders and the updated parent `pom.xml` to
    /// the product repository and opens its pull request.
    async fn submit_projects(
        &self,
        model: &ProductModel,
        syntheses: &[Synthesis],
        report: &mut ScanReport,
    ) -> Result<()> {
        let mut submission = ChangeSubmission::new(
            self.forge,
            model.repo.clone(),
            BRANCH_NAME,
            self.config.actor.clone(),
        );

        let mut parent_xml = model.parent_xml.clone();

        for synthesis in syntheses {
            for (path, content) in synthesis.project.files() {
                let outcome = submission
                    .submit_file(FileChange {
                        path,
                        content,
                        message: CREATED_NEW_FILE_MESSAGE.to_string(),
                        force: false,
                    })
                    .await?;

                if outcome == SubmitOutcome::Conflict {
                    report.conflicts += 1;
                }
            }

            parent_xml = append_module(&parent_xml, &synthesis.module_name)?;
        }

        submission
            .submit_file(FileChange {
                path: POM.to_string(),
                content: parent_xml,
                message: UPDATE_POM_MODULE_MESSAGE.to_string(),
                force: true,
            })
            .await?;

        if let PrOutcome::Failed(_) = submission.open_pr(pr_details()).await? {
            report.failures += 1;
        }

        Ok(())
    }
}
