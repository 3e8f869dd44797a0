//! Local clones of product repositories.
//!
//! The publish job needs the sources on disk to run Maven. Every clone lands
//! in `<work_dir>/<repo name>` and replaces whatever was there before.
use git2::RemoteCallbacks;
use log::*;
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};

use crate::{
    Result,
    forge::config::{RemoteConfig, RepoName},
};

/// User name sent with the token when no actor is configured. GitHub only
/// checks the token for HTTPS clones.
const TOKEN_USER: &str = "x-access-token";

/// Create Git authentication callbacks for username/token authentication.
///
/// The token is passed as plaintext, which is appropriate for HTTPS
/// connections where the transport layer provides encryption.
fn get_auth_callbacks<'r>(user: String, token: String) -> RemoteCallbacks<'r> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username, _allowed| {
        git2::Cred::userpass_plaintext(&user, &token)
    });
    callbacks
}

/// Directory a repository is cloned into.
pub fn checkout_dir(work_dir: &Path, repo: &RepoName) -> PathBuf {
    work_dir.join(&repo.name)
}

/// Removes a previous checkout so the clone starts from a clean directory.
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!("removing previous checkout {}", dir.display());
        std::fs::remove_dir_all(dir)?;
    }

    if let Some(parent) = dir.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(())
}

/// A fresh clone of a repository's default branch.
pub struct Checkout {
    pub repo: RepoName,
    /// Branch that was checked out
    pub branch: String,
    path: PathBuf,
}

impl Checkout {
    /// Clones `branch` of `repo` into `<work_dir>/<repo name>`, deleting any
    /// previous content of that directory first.
    pub fn clone_branch(
        work_dir: &Path,
        config: &RemoteConfig,
        repo: &RepoName,
        branch: &str,
    ) -> Result<Self> {
        let path = checkout_dir(work_dir, repo);
        reset_dir(&path)?;

        let url = config.clone_url(repo);
        let user = config.actor.clone().unwrap_or_else(|| TOKEN_USER.to_string());
        let token = config.token.expose_secret().to_string();

        let mut fetch_options = git2::FetchOptions::new();
        // history is not needed to build the sources
        fetch_options.depth(1);
        fetch_options.remote_callbacks(get_auth_callbacks(user, token));

        info!("cloning {repo} ({branch}) into {}", path.display());

        git2::build::RepoBuilder::new()
            .branch(branch)
            .fetch_options(fetch_options)
            .clone(&url, &path)?;

        Ok(Self {
            repo: repo.clone(),
            branch: branch.to_string(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
