//! Ensures every product repository carries a `CODEOWNERS` file.
use log::*;
use serde::Deserialize;

use crate::{
    Result,
    config::RunConfig,
    forge::{
        config::RepoName,
        manager::ForgeManager,
        request::{FileChange, GetFileContentRequest},
        submission::{ChangeSubmission, PrDetails, PrOutcome, SubmitOutcome},
    },
};

pub const CODE_OWNERS_PATH: &str = ".github/CODEOWNERS";
pub const BRANCH_NAME: &str = "add-code-owners";
pub const COMMIT_MESSAGE: &str = "Add code owners file";
pub const PR_TITLE: &str = "Add code owners file";
pub const PR_BODY: &str =
    "This PR adds a `CODEOWNERS` file so reviews are requested from the owning team.";

const BUNDLED_MAPPING: &str = include_str!("../templates/CodeOwners.json");

/// Maps a product family to the team owning it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeOwner {
    /// Matched as a substring of the repository name
    pub product: String,
    /// Team handle, e.g. `@org/team`
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOwners {
    entries: Vec<CodeOwner>,
}

impl CodeOwners {
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_MAPPING)
    }

    pub fn parse(json: &str) -> Result<Self> {
        let entries = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// First entry whose product is contained in `repo_name`.
    pub fn owner_for(&self, repo_name: &str) -> Option<&CodeOwner> {
        self.entries
            .iter()
            .find(|entry| repo_name.contains(&entry.product))
    }
}

pub fn file_content(owner: &CodeOwner) -> String {
    format!("*  {}\n", owner.owner)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OwnershipReport {
    /// Repositories inspected
    pub checked: usize,
    /// Repositories a `CODEOWNERS` file was proposed for
    pub proposed: Vec<String>,
    /// Repositories without a file and without a matching owner
    pub unmapped: Vec<String>,
    pub failures: usize,
}

impl OwnershipReport {
    pub fn has_issues(&self) -> bool {
        !self.proposed.is_empty() || !self.unmapped.is_empty() || self.failures > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_issues() { 1 } else { 0 }
    }
}

pub struct CodeOwnerDetector<'a> {
    forge: &'a ForgeManager,
    config: &'a RunConfig,
    owners: CodeOwners,
}

impl<'a> CodeOwnerDetector<'a> {
    pub fn new(
        forge: &'a ForgeManager,
        config: &'a RunConfig,
        owners: CodeOwners,
    ) -> Self {
        Self {
            forge,
            config,
            owners,
        }
    }

    pub async fn detect(&self, repos: &[RepoName]) -> Result<OwnershipReport> {
        let mut report = OwnershipReport::default();

        for repo in repos {
            if self.config.is_ignored(&repo.name) {
                debug!("skipping ignored repository {repo}");
                continue;
            }

            report.checked += 1;

            if let Err(err) = self.check(repo, &mut report).await {
                error!("failed to check code owners of {repo}: {err}");
                report.failures += 1;
            }
        }

        info!(
            "checked {} repositories: {} missing code owners, {} without owner, {} failures",
            report.checked,
            report.proposed.len(),
            report.unmapped.len(),
            report.failures
        );

        Ok(report)
    }

    async fn check(
        &self,
        repo: &RepoName,
        report: &mut OwnershipReport,
    ) -> Result<()> {
        let existing = self
            .forge
            .get_file_content(GetFileContentRequest {
                repo: repo.clone(),
                path: CODE_OWNERS_PATH.to_string(),
                branch: None,
            })
            .await?;

        // existing rules are never overwritten
        if existing.is_some_and(|file| !file.content.trim().is_empty()) {
            debug!("{repo} already has {CODE_OWNERS_PATH}");
            return Ok(());
        }

        let Some(owner) = self.owners.owner_for(&repo.name) else {
            warn!("no code owner is known for {repo}");
            report.unmapped.push(repo.full_name());
            return Ok(());
        };

        info!("{repo} is missing {CODE_OWNERS_PATH}: proposing {}", owner.owner);
        report.proposed.push(repo.full_name());

        let mut submission = ChangeSubmission::new(
            self.forge,
            repo.clone(),
            BRANCH_NAME,
            self.config.actor.clone(),
        );

        let outcome = submission
            .submit_file(FileChange {
                path: CODE_OWNERS_PATH.to_string(),
                content: file_content(owner),
                message: COMMIT_MESSAGE.to_string(),
                force: false,
            })
            .await?;

        if outcome == SubmitOutcome::Conflict {
            warn!("{CODE_OWNERS_PATH} on {BRANCH_NAME} of {repo} differs: left alone");
        }

        let details = PrDetails {
            title: PR_TITLE.to_string(),
            body: PR_BODY.to_string(),
        };

        if let PrOutcome::Failed(_) = submission.open_pr(details).await? {
            report.failures += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;

    use super::*;
    use crate::{
        forge::{
            manager::ForgeOptions,
            request::{BranchStatus, PullRequest},
            traits::MockForge,
        },
        test_helpers::file,
    };

    fn repos() -> Vec<RepoName> {
        vec![
            RepoName::new("axonivy-market", "foo-connector"),
            RepoName::new("axonivy-market", "bar-connector"),
            RepoName::new("axonivy-market", "market-up2date-keeper"),
            RepoName::new("axonivy-market", "legacy-connector"),
        ]
    }

    fn config(dry_run: bool) -> RunConfig {
        RunConfig::builder()
            .dry_run(dry_run)
            .actor(Some("octocat".to_string()))
            .ignore_repos("legacy-connector")
            .build()
            .unwrap()
    }

    /// `bar-connector` is compliant, the other two have no file.
    fn mock_reads() -> MockForge {
        let mut mock_forge = MockForge::new();

        mock_forge.expect_get_file_content().returning(|req| {
            assert_ne!(req.repo.name, "legacy-connector");
            Ok(match (req.repo.name.as_str(), req.branch.as_deref()) {
                ("bar-connector", None) => {
                    Some(file(CODE_OWNERS_PATH, "* @someone\n"))
                }
                ("foo-connector", None) => Some(file(CODE_OWNERS_PATH, "  \n")),
                _ => None,
            })
        });

        mock_forge
    }

    #[test]
    fn matches_first_contained_product() {
        let owners = CodeOwners::bundled().unwrap();

        assert_eq!(
            owners.owner_for("foo-connector").map(|o| o.owner.as_str()),
            Some("@axonivy-market/connector-owners")
        );
        assert_eq!(
            owners.owner_for("portal-demo").map(|o| o.owner.as_str()),
            Some("@axonivy-market/demo-owners")
        );
        assert!(owners.owner_for("market-up2date-keeper").is_none());
    }

    #[test]
    fn renders_catch_all_rule() {
        let owner = CodeOwner {
            product: "utils".into(),
            owner: "@axonivy-market/utils-owners".into(),
        };

        assert_eq!(file_content(&owner), "*  @axonivy-market/utils-owners\n");
    }

    #[test_log::test(tokio::test)]
    async fn proposes_missing_code_owners() {
        let mut mock_forge = mock_reads();

        mock_forge
            .expect_default_branch()
            .returning(|_| Ok("main".into()));
        mock_forge
            .expect_get_branch_sha()
            .withf(|req| req.branch == BRANCH_NAME)
            .returning(|_| Ok(None));
        mock_forge
            .expect_get_branch_sha()
            .withf(|req| req.branch == "main")
            .returning(|_| Ok(Some("head".into())));
        mock_forge
            .expect_create_branch()
            .times(1)
            .returning(|_| Ok(BranchStatus::Created));
        mock_forge
            .expect_create_file()
            .withf(|req| {
                req.repo.name == "foo-connector"
                    && req.branch == BRANCH_NAME
                    && req.path == CODE_OWNERS_PATH
                    && req.content == "*  @axonivy-market/connector-owners\n"
            })
            .times(1)
            .returning(|_| Ok(()));
        mock_forge
            .expect_create_pr()
            .withf(|req| req.head_branch == BRANCH_NAME && req.base_branch == "main")
            .times(1)
            .returning(|_| {
                Ok(PullRequest {
                    number: 7,
                    url: "https://github.com/axonivy-market/foo-connector/pull/7"
                        .into(),
                })
            });
        mock_forge
            .expect_assign_pr()
            .with(always())
            .times(1)
            .returning(|_| Ok(()));

        let config = config(false);
        let manager = ForgeManager::new(Box::new(mock_forge), ForgeOptions::default());
        let detector =
            CodeOwnerDetector::new(&manager, &config, CodeOwners::bundled().unwrap());

        let report = detector.detect(&repos()).await.unwrap();

        assert_eq!(report.checked, 3);
        assert_eq!(report.proposed, vec!["axonivy-market/foo-connector"]);
        assert_eq!(report.unmapped, vec!["axonivy-market/market-up2date-keeper"]);
        assert_eq!(report.failures, 0);
        assert_eq!(report.exit_code(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn dry_run_writes_nothing() {
        let mut mock_forge = mock_reads();
        mock_forge
            .expect_default_branch()
            .returning(|_| Ok("main".into()));
        mock_forge
            .expect_get_branch_sha()
            .returning(|req| Ok((req.branch == "main").then(|| "head".into())));
        mock_forge.expect_create_branch().never();
        mock_forge.expect_create_file().never();
        mock_forge.expect_update_file().never();
        mock_forge.expect_create_pr().never();

        let config = config(true);
        let manager = ForgeManager::new(
            Box::new(mock_forge),
            ForgeOptions { dry_run: true },
        );
        let detector =
            CodeOwnerDetector::new(&manager, &config, CodeOwners::bundled().unwrap());

        let report = detector.detect(&repos()).await.unwrap();

        assert_eq!(report.proposed, vec!["axonivy-market/foo-connector"]);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn read_failure_is_counted() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_get_file_content()
            .returning(|_| Err(crate::StewardError::forge("boom")));

        let config = config(false);
        let manager = ForgeManager::new(Box::new(mock_forge), ForgeOptions::default());
        let detector =
            CodeOwnerDetector::new(&manager, &config, CodeOwners::bundled().unwrap());

        let report = detector
            .detect(&[RepoName::new("axonivy-market", "foo-connector")])
            .await
            .unwrap();

        assert_eq!(report.failures, 1);
        assert!(report.proposed.is_empty());
    }

    #[test]
    fn compliant_run_exits_zero() {
        let report = OwnershipReport {
            checked: 4,
            ..Default::default()
        };
        assert_eq!(report.exit_code(), 0);
    }
}
