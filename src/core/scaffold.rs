//! Go service packaging scaffold
//!
//! Data and pure helpers behind `flake-matrix package go`: the persisted
//! `.package-config.json`, GitHub URL parsing and reading the real vendor
//! hash out of a failed `nix build`.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::ScaffoldError;

/// Contents of the scaffold config consumed by the Go package expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoPackageConfig {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// SRI hash of the unpacked source
    pub sha256: String,
    pub vendor_hash: String,
}

impl GoPackageConfig {
    /// A config is a retry when it was filled in by an earlier run
    pub fn is_retry(&self) -> bool {
        self.name != defaults::SCAFFOLD_TEMPLATE_NAME
    }

    /// `github.com/<owner>/<repo>`
    pub fn github_url(&self) -> String {
        format!("github.com/{}/{}", self.owner, self.repo)
    }

    /// Flake attribute the package builds as
    pub fn flake_attr(&self) -> String {
        format!(".#{}", self.name)
    }

    /// Copy with the vendor hash replaced by the mismatch-provoking fake
    pub fn with_fake_vendor_hash(&self) -> Self {
        Self {
            vendor_hash: defaults::FAKE_HASH.to_string(),
            ..self.clone()
        }
    }

    /// Human-readable summary shown before confirmation
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!("Package name:  {}", self.name),
            format!("Description:   {}", self.description),
            format!("Source:        {}", self.github_url()),
            format!("Ref:           {}", self.git_ref),
            format!("Source hash:   {}", self.sha256),
            format!("Vendor hash:   {}", self.vendor_hash),
        ]
    }

    /// Load the config at `path`, if present
    pub fn load(path: &Path) -> Result<Option<Self>, ScaffoldError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| config_error(path, &e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| config_error(path, &e))
    }

    /// Write pretty JSON with a trailing newline
    pub fn save(&self, path: &Path) -> Result<(), ScaffoldError> {
        let mut content = serde_json::to_string_pretty(self).map_err(|e| config_error(path, &e))?;
        content.push('\n');
        fs::write(path, content).map_err(|e| config_error(path, &e))
    }
}

fn config_error(path: &Path, error: &dyn std::fmt::Display) -> ScaffoldError {
    ScaffoldError::Config {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub repo: String,
}

impl GithubRepo {
    /// Source tarball for `git_ref` below `base` (normally `https://github.com`)
    pub fn archive_url(&self, base: &str, git_ref: &str) -> String {
        format!(
            "{}/{}/{}/archive/{git_ref}.tar.gz",
            base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

/// Parse `github.com/owner/repo`, with optional scheme, `.git` suffix and
/// trailing slashes
pub fn parse_github_url(url: &str) -> Result<GithubRepo, ScaffoldError> {
    let invalid = || ScaffoldError::InvalidGithubUrl {
        url: url.to_string(),
    };

    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let re = Regex::new(r"^github\.com/([^/]+)/([^/]+)$").map_err(|_| invalid())?;
    let caps = re.captures(trimmed).ok_or_else(invalid)?;

    Ok(GithubRepo {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
    })
}

/// Find the real vendor hash in the stderr of a hash-mismatch build
///
/// Looks for a `got:` line whose last token is an SRI sha256 hash.
pub fn extract_vendor_hash(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("got:"))
        .filter_map(|line| line.split_whitespace().last())
        .find(|hash| hash.starts_with("sha256-"))
        .map(str::to_string)
}

/// The last `max` characters of `text`
pub fn tail(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    let start = text
        .char_indices()
        .nth(count - max)
        .map_or(0, |(i, _)| i);
    &text[start..]
}
