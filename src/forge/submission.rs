//! Branch → commit → pull request workflow shared by every job.
//!
//! A [`ChangeSubmission`] is bound to one repository and one working branch.
//! All files submitted through it land on that branch so a single pull request
//! collects every change of a run.
use log::*;

use crate::{
    Result, StewardError,
    forge::{
        config::RepoName,
        manager::ForgeManager,
        request::{
            AssignPrRequest, BranchRequest, BranchStatus, CreateBranchRequest,
            CreateFileRequest, CreatePrRequest, FileChange,
            GetFileContentRequest, PullRequest, UpdateFileRequest,
        },
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    NoBranch,
    BranchEnsured,
    FileSubmitted(String),
    PrRequested,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
    /// File already holds the submitted content
    Unchanged,
    /// File exists with other content and force was not set
    Conflict,
}

impl SubmitOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrOutcome {
    Opened(PullRequest),
    /// Nothing was committed on the branch
    NotNeeded,
    /// The platform rejected the request; the run continues
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PrDetails {
    pub title: String,
    pub body: String,
}

pub struct ChangeSubmission<'a> {
    forge: &'a ForgeManager,
    repo: RepoName,
    branch: String,
    assignee: Option<String>,
    base_branch: Option<String>,
    /// Branch file reads go to. Falls back to the base branch when the
    /// working branch only exists in a dry run.
    read_branch: Option<String>,
    state: SubmissionState,
    changes: usize,
}

impl<'a> ChangeSubmission<'a> {
    pub fn new(
        forge: &'a ForgeManager,
        repo: RepoName,
        branch: impl Into<String>,
        assignee: Option<String>,
    ) -> Self {
        Self {
            forge,
            repo,
            branch: branch.into(),
            assignee,
            base_branch: None,
            read_branch: None,
            state: SubmissionState::NoBranch,
            changes: 0,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Number of files created or updated so far.
    pub fn changes(&self) -> usize {
        self.changes
    }

    async fn base_branch(&mut self) -> Result<String> {
        if let Some(base) = &self.base_branch {
            return Ok(base.clone());
        }

        let base = self.forge.default_branch(&self.repo).await?;
        self.base_branch = Some(base.clone());
        Ok(base)
    }

    /// Creates the working branch from the head of the default branch.
    /// An existing branch counts as success.
    pub async fn ensure_branch(&mut self) -> Result<BranchStatus> {
        if self.state != SubmissionState::NoBranch {
            return Ok(BranchStatus::AlreadyExists);
        }

        let base = self.base_branch().await?;

        let existing = self
            .forge
            .get_branch_sha(BranchRequest {
                repo: self.repo.clone(),
                branch: self.branch.clone(),
            })
            .await?;

        let status = if existing.is_some() {
            info!("branch {} already exists in {}", self.branch, self.repo);
            BranchStatus::AlreadyExists
        } else {
            let sha = self
                .forge
                .get_branch_sha(BranchRequest {
                    repo: self.repo.clone(),
                    branch: base.clone(),
                })
                .await?
                .ok_or_else(|| {
                    StewardError::forge(format!(
                        "failed to find head of {base} in {}",
                        self.repo
                    ))
                })?;

            let status = self
                .forge
                .create_branch(CreateBranchRequest {
                    repo: self.repo.clone(),
                    branch: self.branch.clone(),
                    sha,
                })
                .await?;

            info!("branch ensured: {}/{}", self.repo, self.branch);
            status
        };

        self.read_branch = if existing.is_none() && self.forge.dry_run() {
            Some(base)
        } else {
            Some(self.branch.clone())
        };

        self.state = SubmissionState::BranchEnsured;

        Ok(status)
    }

    /// Commits a single file onto the working branch.
    pub async fn submit_file(
        &mut self,
        change: FileChange,
    ) -> Result<SubmitOutcome> {
        if self.state == SubmissionState::NoBranch {
            self.ensure_branch().await?;
        }

        let existing = self
            .forge
            .get_file_content(GetFileContentRequest {
                repo: self.repo.clone(),
                path: change.path.clone(),
                branch: self.read_branch.clone(),
            })
            .await?;

        let outcome = match existing {
            None => {
                self.forge
                    .create_file(CreateFileRequest {
                        repo: self.repo.clone(),
                        branch: self.branch.clone(),
                        path: change.path.clone(),
                        message: change.message,
                        content: change.content,
                    })
                    .await?;
                info!("file created: {}", change.path);
                SubmitOutcome::Created
            }
            Some(file) if file.content == change.content => {
                info!(
                    "file unchanged, skip update: {}/{}",
                    self.branch, change.path
                );
                SubmitOutcome::Unchanged
            }
            Some(file) if change.force => {
                self.forge
                    .update_file(UpdateFileRequest {
                        repo: self.repo.clone(),
                        branch: self.branch.clone(),
                        path: change.path.clone(),
                        message: change.message,
                        content: change.content,
                        sha: file.sha,
                    })
                    .await?;
                info!(
                    "file already exists, forced update: {}/{}",
                    self.branch, change.path
                );
                SubmitOutcome::Updated
            }
            Some(_) => {
                error!(
                    "file already exists, skip update: {}/{}",
                    self.branch, change.path
                );
                SubmitOutcome::Conflict
            }
        };

        if outcome.is_change() {
            self.changes += 1;
        }

        self.state = SubmissionState::FileSubmitted(change.path);

        Ok(outcome)
    }

    /// Opens a pull request from the working branch onto the default branch.
    /// Platform failures are reported through [`PrOutcome::Failed`].
    pub async fn open_pr(&mut self, details: PrDetails) -> Result<PrOutcome> {
        if self.changes == 0 {
            info!("no changes committed to {}: skipping PR", self.repo);
            self.state = SubmissionState::Done;
            return Ok(PrOutcome::NotNeeded);
        }

        let base = self.base_branch().await?;

        self.state = SubmissionState::PrRequested;

        let result = self
            .forge
            .create_pr(CreatePrRequest {
                repo: self.repo.clone(),
                head_branch: self.branch.clone(),
                base_branch: base,
                title: details.title,
                body: details.body,
            })
            .await;

        let pr = match result {
            Ok(pr) => pr,
            Err(err) => {
                error!("failed to create pull request for {}: {err}", self.repo);
                self.state = SubmissionState::Done;
                return Ok(PrOutcome::Failed(err.to_string()));
            }
        };

        info!("pull request created: {}", pr.url);

        if let Some(assignee) = self.assignee.clone()
            && let Err(err) = self
                .forge
                .assign_pr(AssignPrRequest {
                    repo: self.repo.clone(),
                    pr_number: pr.number,
                    assignees: vec![assignee.clone()],
                })
                .await
        {
            warn!("failed to assign PR #{} to {assignee}: {err}", pr.number);
        }

        self.state = SubmissionState::Done;

        Ok(PrOutcome::Opened(pr))
    }
}
