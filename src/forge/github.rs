//! Implements the Forge trait for Github
use async_trait::async_trait;
use log::*;
use octocrab::{
    Octocrab,
    models::repos::Object,
    params::repos::Reference,
};
use reqwest::StatusCode;

use crate::{
    Result, StewardError,
    forge::{
        config::{RemoteConfig, RepoName},
        request::{
            AssignPrRequest, BranchRequest, BranchStatus, CreateBranchRequest,
            CreateFileRequest, CreatePrRequest, DirectoryEntry,
            DirectoryRequest, EntryKind, FileContent, GetFileContentRequest,
            PullRequest, UpdateFileRequest,
        },
        traits::Forge,
    },
};

const PAGE_SIZE: u8 = 100;

/// GitHub forge implementation using Octocrab for API interactions with
/// repository contents, refs and pull requests.
pub struct Github {
    instance: Octocrab,
}

impl Github {
    /// Create GitHub client with personal access token authentication and API
    /// base URL configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let instance = Octocrab::builder()
            .personal_token(config.token.clone())
            .base_uri(config.api_base_url.clone())?
            .build()?;

        Ok(Self { instance })
    }
}

/// Returns the HTTP status carried by a GitHub API error, if any.
fn github_status(err: &octocrab::Error) -> Option<StatusCode> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code),
        _ => None,
    }
}

fn entry_kind(kind: &str) -> EntryKind {
    match kind {
        "file" => EntryKind::File,
        "dir" => EntryKind::Dir,
        _ => EntryKind::Other,
    }
}

#[async_trait]
impl Forge for Github {
    async fn default_branch(&self, repo: RepoName) -> Result<String> {
        let data = self.instance.repos(&repo.owner, &repo.name).get().await?;

        data.default_branch.ok_or_else(|| {
            StewardError::forge(format!(
                "failed to find default branch for repo: {repo}"
            ))
        })
    }

    async fn get_branch_sha(
        &self,
        req: BranchRequest,
    ) -> Result<Option<String>> {
        let result = self
            .instance
            .repos(&req.repo.owner, &req.repo.name)
            .get_ref(&Reference::Branch(req.branch.clone()))
            .await;

        match result {
            Ok(reference) => match reference.object {
                Object::Commit { sha, .. } => Ok(Some(sha)),
                _ => Err(StewardError::forge(format!(
                    "ref {} of {} does not point at a commit",
                    req.branch, req.repo
                ))),
            },
            Err(err) if github_status(&err) == Some(StatusCode::NOT_FOUND) => {
                debug!("branch {} not found in {}", req.branch, req.repo);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create_branch(
        &self,
        req: CreateBranchRequest,
    ) -> Result<BranchStatus> {
        let result = self
            .instance
            .repos(&req.repo.owner, &req.repo.name)
            .create_ref(&Reference::Branch(req.branch.clone()), req.sha)
            .await;

        match result {
            Ok(_) => Ok(BranchStatus::Created),
            Err(err)
                if github_status(&err)
                    == Some(StatusCode::UNPROCESSABLE_ENTITY) =>
            {
                info!("branch {} already exists in {}", req.branch, req.repo);
                Ok(BranchStatus::AlreadyExists)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_directory(
        &self,
        req: DirectoryRequest,
    ) -> Result<Vec<DirectoryEntry>> {
        let repos = self.instance.repos(&req.repo.owner, &req.repo.name);
        let mut builder = repos.get_content().path(&req.path);

        if let Some(branch) = req.branch {
            builder = builder.r#ref(branch);
        }

        let mut data = builder.send().await?;

        Ok(data
            .take_items()
            .into_iter()
            .map(|item| DirectoryEntry {
                kind: entry_kind(&item.r#type),
                name: item.name,
                path: item.path,
            })
            .collect())
    }

    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<FileContent>> {
        let path = req.path.strip_prefix("./").unwrap_or(&req.path);
        let repos = self.instance.repos(&req.repo.owner, &req.repo.name);
        let mut builder = repos.get_content().path(path);

        if let Some(branch) = req.branch.clone() {
            builder = builder.r#ref(branch);
        }

        match builder.send().await {
            Err(err) if github_status(&err) == Some(StatusCode::NOT_FOUND) => {
                debug!("no file found for path: {path}");
                Ok(None)
            }
            Err(err) => {
                let msg = format!(
                    "encountered error getting file contents for path: {path}: {err}"
                );
                error!("{msg}");
                Err(StewardError::forge(msg))
            }
            Ok(mut data) => {
                let items = data.take_items();

                if items.is_empty() {
                    debug!("no file found for path: {path}");
                    return Ok(None);
                }

                let item = &items[0];

                if item.r#type != "file" {
                    return Ok(None);
                }

                let content = item.decoded_content().ok_or_else(|| {
                    StewardError::forge(format!(
                        "failed to decode file content for path: {path}"
                    ))
                })?;

                Ok(Some(FileContent {
                    path: item.path.clone(),
                    sha: item.sha.clone(),
                    content,
                }))
            }
        }
    }

    async fn create_file(&self, req: CreateFileRequest) -> Result<()> {
        self.instance
            .repos(&req.repo.owner, &req.repo.name)
            .create_file(&req.path, &req.message, &req.content)
            .branch(&req.branch)
            .send()
            .await?;

        info!("file created: {}/{}", req.branch, req.path);

        Ok(())
    }

    async fn update_file(&self, req: UpdateFileRequest) -> Result<()> {
        self.instance
            .repos(&req.repo.owner, &req.repo.name)
            .update_file(&req.path, &req.message, &req.content, &req.sha)
            .branch(&req.branch)
            .send()
            .await?;

        info!("file updated: {}/{}", req.branch, req.path);

        Ok(())
    }

    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        let pr = self
            .instance
            .pulls(&req.repo.owner, &req.repo.name)
            .create(req.title, req.head_branch, req.base_branch)
            .body(req.body)
            .send()
            .await?;

        Ok(PullRequest {
            number: pr.number,
            url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
        })
    }

    async fn assign_pr(&self, req: AssignPrRequest) -> Result<()> {
        let assignees =
            req.assignees.iter().map(String::as_str).collect::<Vec<_>>();

        self.instance
            .issues(&req.repo.owner, &req.repo.name)
            .add_assignees(req.pr_number, &assignees)
            .await?;

        Ok(())
    }

    async fn list_org_repos(&self, org: String) -> Result<Vec<RepoName>> {
        let page = self
            .instance
            .orgs(&org)
            .list_repos()
            .per_page(PAGE_SIZE)
            .send()
            .await?;

        let repos = self.instance.all_pages(page).await?;

        Ok(repos
            .into_iter()
            .filter(|r| !r.archived.unwrap_or(false))
            .map(|r| {
                let owner =
                    r.owner.map(|o| o.login).unwrap_or_else(|| org.clone());
                RepoName::new(owner, r.name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_content_types() {
        assert_eq!(entry_kind("file"), EntryKind::File);
        assert_eq!(entry_kind("dir"), EntryKind::Dir);
        assert_eq!(entry_kind("symlink"), EntryKind::Other);
    }

    #[tokio::test]
    async fn builds_client_from_remote_config() {
        let config = RemoteConfig::default();
        assert!(Github::new(&config).is_ok());
    }
}
