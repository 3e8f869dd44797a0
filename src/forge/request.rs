use crate::forge::config::RepoName;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to look up the head commit of a branch.
pub struct BranchRequest {
    pub repo: RepoName,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a branch pointing at `sha`.
pub struct CreateBranchRequest {
    pub repo: RepoName,
    pub branch: String,
    pub sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of a branch creation attempt.
pub enum BranchStatus {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to list a directory, on the default branch when `branch` is None.
pub struct DirectoryRequest {
    pub repo: RepoName,
    pub path: String,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single entry of a directory listing.
pub struct DirectoryEntry {
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to read a file, on the default branch when `branch` is None.
pub struct GetFileContentRequest {
    pub repo: RepoName,
    pub path: String,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded file content plus the blob sha needed for updates.
pub struct FileContent {
    pub path: String,
    pub sha: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a new file on a branch.
pub struct CreateFileRequest {
    pub repo: RepoName,
    pub branch: String,
    pub path: String,
    pub message: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to replace an existing file, identified by its blob sha.
pub struct UpdateFileRequest {
    pub repo: RepoName,
    pub branch: String,
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a new pull request.
pub struct CreatePrRequest {
    pub repo: RepoName,
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Pull request information.
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to assign users to a pull request.
pub struct AssignPrRequest {
    pub repo: RepoName,
    pub pr_number: u64,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A file to commit onto the working branch.
pub struct FileChange {
    /// Relative path to the file starting from repo root
    pub path: String,
    pub content: String,
    pub message: String,
    /// Overwrite the file when it already exists with different content
    pub force: bool,
}
