//! HTTP checks against GitHub
//!
//! Confirms a repository ref has a downloadable source archive before any
//! hashing work starts. Transport failures are retried with exponential
//! backoff; HTTP status codes are answers, not failures.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use reqwest::{redirect, StatusCode};

use crate::config::{defaults, urls};
use crate::core::scaffold::GithubRepo;
use crate::error::ScaffoldError;

/// Checks source archive URLs with `HEAD` requests
#[derive(Debug, Clone)]
pub struct RefValidator {
    client: reqwest::Client,
    base_url: String,
    retry_budget: Duration,
}

impl RefValidator {
    /// Validator against github.com
    pub fn new() -> Self {
        Self::with_base_url(urls::GITHUB_ARCHIVE)
    }

    /// Validator against another archive host (used by tests)
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(defaults::REF_CHECK_TIMEOUT))
                .redirect(redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.to_string(),
            retry_budget: Duration::from_secs(defaults::REF_CHECK_RETRY_BUDGET),
        }
    }

    /// Override how long transport errors are retried
    #[must_use]
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Archive URL for `repo` at `git_ref`
    pub fn archive_url(&self, repo: &GithubRepo, git_ref: &str) -> String {
        repo.archive_url(&self.base_url, git_ref)
    }

    /// Whether the archive for `git_ref` resolves
    ///
    /// GitHub answers a valid archive with 200 or a 302 to codeload.
    pub async fn ref_exists(&self, repo: &GithubRepo, git_ref: &str) -> Result<bool, ScaffoldError> {
        let url = self.archive_url(repo, git_ref);
        tracing::debug!("HEAD {url}");

        let policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(self.retry_budget))
            .build();
        let client = &self.client;
        let target = url.as_str();

        let status = backoff::future::retry(policy, move || async move {
            client
                .head(target)
                .send()
                .await
                .map(|response| response.status())
                .map_err(|e| {
                    tracing::debug!("HEAD {target} failed, retrying: {e}");
                    backoff::Error::transient(e)
                })
        })
        .await
        .map_err(|e| ScaffoldError::Network {
            url: url.clone(),
            error: e.to_string(),
        })?;

        tracing::debug!("HEAD {url} -> {status}");
        Ok(status == StatusCode::OK || status == StatusCode::FOUND)
    }
}

impl Default for RefValidator {
    fn default() -> Self {
        Self::new()
    }
}
