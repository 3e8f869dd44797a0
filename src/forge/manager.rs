//! Manager that wraps forge implementations
use log::*;
use std::sync::Mutex;

use crate::{
    Result,
    forge::{
        config::RepoName,
        request::{
            AssignPrRequest, BranchRequest, BranchStatus, CreateBranchRequest,
            CreateFileRequest, CreatePrRequest, DirectoryEntry,
            DirectoryRequest, FileContent, GetFileContentRequest, PullRequest,
            UpdateFileRequest,
        },
        traits::Forge,
    },
};

#[derive(Debug, Clone, Default)]
pub struct ForgeOptions {
    /// Replace every mutating call with a log entry
    pub dry_run: bool,
}

/// Wraps a [`Forge`] and short-circuits every mutating call when running in
/// dry-run mode. Read calls always reach the forge.
pub struct ForgeManager {
    forge: Box<dyn Forge>,
    options: ForgeOptions,
    skipped: Mutex<Vec<String>>,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>, options: ForgeOptions) -> Self {
        Self {
            forge,
            options,
            skipped: Mutex::new(vec![]),
        }
    }

    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Every `dry_run:` line logged so far, in order
    pub fn skipped_actions(&self) -> Vec<String> {
        self.skipped
            .lock()
            .map(|skipped| skipped.clone())
            .unwrap_or_default()
    }

    fn skip(&self, action: String) {
        let line = format!("dry_run: would {action}");
        warn!("{line}");
        if let Ok(mut skipped) = self.skipped.lock() {
            skipped.push(line);
        }
    }

    pub async fn default_branch(&self, repo: &RepoName) -> Result<String> {
        self.forge.default_branch(repo.clone()).await
    }

    pub async fn get_branch_sha(
        &self,
        req: BranchRequest,
    ) -> Result<Option<String>> {
        self.forge.get_branch_sha(req).await
    }

    pub async fn list_directory(
        &self,
        req: DirectoryRequest,
    ) -> Result<Vec<DirectoryEntry>> {
        debug!("listing directory {} of {}", req.path, req.repo);
        self.forge.list_directory(req).await
    }

    pub async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<FileContent>> {
        self.forge.get_file_content(req).await
    }

    pub async fn list_org_repos(&self, org: &str) -> Result<Vec<RepoName>> {
        self.forge.list_org_repos(org.to_string()).await
    }

    pub async fn create_branch(
        &self,
        req: CreateBranchRequest,
    ) -> Result<BranchStatus> {
        if self.options.dry_run {
            self.skip(format!("create branch {} on {}", req.branch, req.repo));
            return Ok(BranchStatus::Created);
        }
        self.forge.create_branch(req).await
    }

    pub async fn create_file(&self, req: CreateFileRequest) -> Result<()> {
        if self.options.dry_run {
            self.skip(format!(
                "create file {} on {}/{}",
                req.path, req.repo, req.branch
            ));
            return Ok(());
        }
        self.forge.create_file(req).await
    }

    pub async fn update_file(&self, req: UpdateFileRequest) -> Result<()> {
        if self.options.dry_run {
            self.skip(format!(
                "update file {} on {}/{}",
                req.path, req.repo, req.branch
            ));
            return Ok(());
        }
        self.forge.update_file(req).await
    }

    pub async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        if self.options.dry_run {
            self.skip(format!(
                "create PR {} -> {} on {}: {}",
                req.head_branch, req.base_branch, req.repo, req.title
            ));
            return Ok(PullRequest {
                number: 0,
                url: String::new(),
            });
        }
        self.forge.create_pr(req).await
    }

    pub async fn assign_pr(&self, req: AssignPrRequest) -> Result<()> {
        if self.options.dry_run {
            self.skip(format!(
                "assign PR #{} on {} to {}",
                req.pr_number,
                req.repo,
                req.assignees.join(", ")
            ));
            return Ok(());
        }
        self.forge.assign_pr(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::traits::MockForge;

    fn dry_run_manager(mock_forge: MockForge) -> ForgeManager {
        ForgeManager::new(Box::new(mock_forge), ForgeOptions { dry_run: true })
    }

    fn repo() -> RepoName {
        RepoName::new("owner", "repo")
    }

    #[tokio::test]
    async fn dry_run_prevents_create_branch() {
        let manager = dry_run_manager(MockForge::new());

        let result = manager
            .create_branch(CreateBranchRequest {
                repo: repo(),
                branch: "fix-missing-maven-artifacts".into(),
                sha: "abc123".into(),
            })
            .await
            .unwrap();

        assert_eq!(result, BranchStatus::Created);
    }

    #[tokio::test]
    async fn dry_run_prevents_file_writes() {
        let manager = dry_run_manager(MockForge::new());

        let created = manager
            .create_file(CreateFileRequest {
                repo: repo(),
                branch: "branch".into(),
                path: "foo-app/pom.xml".into(),
                message: "Created new file".into(),
                content: "<project/>".into(),
            })
            .await;

        let updated = manager
            .update_file(UpdateFileRequest {
                repo: repo(),
                branch: "branch".into(),
                path: "pom.xml".into(),
                message: "Update POM module".into(),
                content: "<project/>".into(),
                sha: "def456".into(),
            })
            .await;

        assert!(created.is_ok());
        assert!(updated.is_ok());
        assert_eq!(
            manager.skipped_actions(),
            vec![
                "dry_run: would create file foo-app/pom.xml on owner/repo/branch",
                "dry_run: would update file pom.xml on owner/repo/branch",
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_prevents_create_and_assign_pr() {
        let manager = dry_run_manager(MockForge::new());

        let pr = manager
            .create_pr(CreatePrRequest {
                repo: repo(),
                head_branch: "branch".into(),
                base_branch: "master".into(),
                title: "title".into(),
                body: "body".into(),
            })
            .await
            .unwrap();

        assert_eq!(pr.number, 0);

        let assigned = manager
            .assign_pr(AssignPrRequest {
                repo: repo(),
                pr_number: 0,
                assignees: vec!["octocat".into()],
            })
            .await;

        assert!(assigned.is_ok());
    }

    #[tokio::test]
    async fn dry_run_still_reads() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_default_branch()
            .times(1)
            .returning(|_| Ok("master".into()));

        let manager = dry_run_manager(mock_forge);

        assert_eq!(manager.default_branch(&repo()).await.unwrap(), "master");
        assert!(manager.skipped_actions().is_empty());
    }

    #[tokio::test]
    async fn live_mode_forwards_mutations() {
        let mut mock_forge = MockForge::new();
        mock_forge
            .expect_create_file()
            .times(1)
            .returning(|_| Ok(()));

        let manager =
            ForgeManager::new(Box::new(mock_forge), ForgeOptions::default());

        let result = manager
            .create_file(CreateFileRequest {
                repo: repo(),
                branch: "branch".into(),
                path: "README.md".into(),
                message: "add".into(),
                content: "hi".into(),
            })
            .await;

        assert!(result.is_ok());
    }
}
