//! Traits related to the remote git forge
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

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
    },
};

/// Thin request/response contract over the hosting platform. Every method
/// may fail with a transport-level error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    async fn default_branch(&self, repo: RepoName) -> Result<String>;
    async fn get_branch_sha(&self, req: BranchRequest)
    -> Result<Option<String>>;
    async fn create_branch(
        &self,
        req: CreateBranchRequest,
    ) -> Result<BranchStatus>;
    async fn list_directory(
        &self,
        req: DirectoryRequest,
    ) -> Result<Vec<DirectoryEntry>>;
    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<FileContent>>;
    async fn create_file(&self, req: CreateFileRequest) -> Result<()>;
    async fn update_file(&self, req: UpdateFileRequest) -> Result<()>;
    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest>;
    async fn assign_pr(&self, req: AssignPrRequest) -> Result<()>;
    async fn list_org_repos(&self, org: String) -> Result<Vec<RepoName>>;
}
