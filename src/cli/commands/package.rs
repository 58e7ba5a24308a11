//! CLI command for `flake-matrix package go`
//!
//! Interactive scaffold that pins a Go service from GitHub: validates the
//! ref, computes the source and vendor hashes, writes the package config and
//! verifies the build.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::output::{create_spinner, print_detail, print_info, print_success, print_warning};
use crate::config::defaults;
use crate::core::global_config::GlobalConfig;
use crate::core::scaffold::{extract_vendor_hash, parse_github_url, tail, GoPackageConfig, GithubRepo};
use crate::error::ScaffoldError;
use crate::infra::http::RefValidator;
use crate::infra::nix;

/// Values given on the command line; anything missing is prompted for
#[derive(Debug, Default)]
pub struct GoOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub git_ref: Option<String>,
    /// Skip the confirmation prompt
    pub yes: bool,
}

/// Ask for a non-empty value, offering `default` on an empty answer
fn prompt_with<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    message: &str,
    default: Option<&str>,
) -> Result<String> {
    loop {
        match default {
            Some(default) => write!(out, "{message} [{default}]: ")?,
            None => write!(out, "{message}: ")?,
        }
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("Input closed while waiting for: {message}");
        }
        let value = line.trim();
        if !value.is_empty() {
            return Ok(value.to_string());
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
        writeln!(out, "  Value cannot be empty.")?;
    }
}

/// Whether a `[Y/n]` answer declines
fn declined(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "n" | "no")
}

struct Prompter {
    interactive: bool,
}

impl Prompter {
    fn from_terminal() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    /// The flag value if given, otherwise an interactive answer
    fn value(&self, given: Option<String>, message: &str, default: Option<&str>) -> Result<String> {
        if let Some(value) = given.filter(|v| !v.trim().is_empty()) {
            return Ok(value.trim().to_string());
        }
        if !self.interactive {
            bail!(
                "Cannot prompt for '{message}' in non-interactive mode.\n\
                 Pass it on the command line instead."
            );
        }
        prompt_with(&mut io::stdin().lock(), &mut io::stderr(), message, default)
    }

    /// A GitHub repository, re-asking while the URL does not parse
    fn repo(&self, given: Option<String>, default: Option<&str>) -> Result<GithubRepo> {
        let mut given = given;
        loop {
            let url = self.value(given.take(), "GitHub URL (e.g. github.com/supabase/auth)", default)?;
            match parse_github_url(&url) {
                Ok(repo) => return Ok(repo),
                Err(e) if self.interactive => {
                    print_warning(&format!("{e}. Expected format: github.com/owner/repo"));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn confirm(&self, yes: bool) -> Result<bool> {
        if yes {
            return Ok(true);
        }
        if !self.interactive {
            bail!(
                "Cannot prompt for confirmation in non-interactive mode.\n\
                 Use --yes to skip confirmation."
            );
        }
        eprint!("Apply these changes? [Y/n]: ");
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(!declined(&answer))
    }
}

/// Build with the fake vendor hash and read the real one from the mismatch
async fn compute_vendor_hash(config: &GoPackageConfig, config_path: &Path) -> Result<String> {
    config.with_fake_vendor_hash().save(config_path)?;

    let spinner = create_spinner("Computing vendorHash (building with fake hash to get real one)");
    let output = nix::build_captured(&config.flake_attr()).await;
    spinner.finish_and_clear();
    let output = output?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if let Some(hash) = extract_vendor_hash(&stderr) {
        return Ok(hash);
    }
    if output.status.success() {
        tracing::info!("Build succeeded with the placeholder vendor hash");
        return Ok(defaults::FAKE_HASH.to_string());
    }
    Err(ScaffoldError::CommandFailed {
        command: format!("nix build {} --no-link", config.flake_attr()),
        stderr: tail(&stderr, defaults::STDERR_TAIL).to_string(),
    }
    .into())
}

/// Execute `package go` in `project_dir`
pub async fn execute_go(project_dir: &Path, config: &GlobalConfig, options: GoOptions) -> Result<()> {
    execute_go_with(project_dir, config, options, &RefValidator::new()).await
}

async fn execute_go_with(
    project_dir: &Path,
    config: &GlobalConfig,
    options: GoOptions,
    validator: &RefValidator,
) -> Result<()> {
    let config_path = project_dir.join(config.scaffold_config_file());
    let existing = GoPackageConfig::load(&config_path)?.filter(GoPackageConfig::is_retry);
    if let Some(existing) = &existing {
        print_info(&format!(
            "Found existing config for '{}'. Values shown as defaults.",
            existing.name
        ));
    }

    let prompter = Prompter::from_terminal();
    let name = prompter.value(
        options.name,
        "Package name (e.g. auth)",
        existing.as_ref().map(|c| c.name.as_str()),
    )?;
    let description = prompter.value(
        options.description,
        "Description (e.g. Supabase Auth server)",
        existing.as_ref().map(|c| c.description.as_str()),
    )?;
    let default_url = existing.as_ref().map(GoPackageConfig::github_url);
    let repo = prompter.repo(options.url, default_url.as_deref())?;
    let git_ref = prompter.value(
        options.git_ref,
        "Git tag or commit to package (e.g. v2.175.0)",
        existing.as_ref().map(|c| c.git_ref.as_str()),
    )?;

    print_info(&format!("Validating {}/{} @ {git_ref} ...", repo.owner, repo.repo));
    if !validator.ref_exists(&repo, &git_ref).await? {
        return Err(ScaffoldError::UnresolvedRef {
            owner: repo.owner,
            repo: repo.repo,
            git_ref,
        }
        .into());
    }

    let archive = validator.archive_url(&repo, &git_ref);
    let spinner = create_spinner(&format!("Prefetching source from {archive}"));
    let sha256 = nix::prefetch_source(&archive).await;
    spinner.finish_and_clear();
    let sha256 = sha256.context("Failed to compute source hash")?;
    print_detail(&format!("Source hash: {sha256}"));

    let mut package = GoPackageConfig {
        name,
        description,
        owner: repo.owner,
        repo: repo.repo,
        git_ref,
        sha256,
        vendor_hash: String::new(),
    };
    package.vendor_hash = compute_vendor_hash(&package, &config_path)
        .await
        .context("Failed to compute vendorHash")?;
    print_detail(&format!("Vendor hash: {}", package.vendor_hash));

    print_info("Summary");
    for line in package.summary() {
        print_detail(&line);
    }

    if !prompter.confirm(options.yes)? {
        print_info("Cancelled. Re-run `flake-matrix package go` to try again.");
        return Ok(());
    }

    package.save(&config_path)?;
    print_success(&format!("Wrote {}", config_path.display()));

    print_info(&format!("Verifying: nix build {} ...", package.flake_attr()));
    if nix::build_streaming(&package.flake_attr()).await? {
        print_success(&format!(
            "Success! Run `nix build {}` anytime to rebuild.",
            package.flake_attr()
        ));
        Ok(())
    } else {
        bail!(
            "Build failed. The config has been saved; re-run `flake-matrix package go` to retry."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(answers: &str, default: Option<&str>) -> (Result<String>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut out = Vec::new();
        let value = prompt_with(&mut input, &mut out, "Package name", default);
        (value, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prompt_returns_trimmed_answer() {
        let (value, out) = ask("  auth \n", None);
        assert_eq!(value.unwrap(), "auth");
        assert_eq!(out, "Package name: ");
    }

    #[test]
    fn test_prompt_uses_default_on_empty_answer() {
        let (value, out) = ask("\n", Some("auth"));
        assert_eq!(value.unwrap(), "auth");
        assert_eq!(out, "Package name [auth]: ");
    }

    #[test]
    fn test_prompt_repeats_until_non_empty() {
        let (value, out) = ask("\n\nstorage\n", None);
        assert_eq!(value.unwrap(), "storage");
        assert_eq!(out.matches("Value cannot be empty.").count(), 2);
    }

    #[test]
    fn test_prompt_fails_on_closed_input() {
        let (value, _) = ask("", None);
        assert!(value.is_err());
    }

    #[test]
    fn test_declined_answers() {
        assert!(declined("n\n"));
        assert!(declined(" No "));
        assert!(!declined(""));
        assert!(!declined("y"));
        assert!(!declined("whatever"));
    }

    #[test]
    fn test_non_interactive_prompter_takes_flags_only() {
        let prompter = Prompter { interactive: false };
        assert_eq!(
            prompter.value(Some(" auth ".into()), "Package name", None).unwrap(),
            "auth"
        );
        assert!(prompter.value(None, "Package name", Some("auth")).is_err());
        assert!(prompter.confirm(true).unwrap());
        assert!(prompter.confirm(false).is_err());
    }

    #[test]
    fn test_non_interactive_invalid_url_is_an_error() {
        let prompter = Prompter { interactive: false };
        assert!(prompter.repo(Some("gitlab.com/a/b".into()), None).is_err());
        let repo = prompter
            .repo(Some("https://github.com/supabase/auth.git/".into()), None)
            .unwrap();
        assert_eq!(repo.owner, "supabase");
        assert_eq!(repo.repo, "auth");
    }

    #[tokio::test]
    async fn test_unresolved_ref_stops_before_hashing() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let options = GoOptions {
            name: Some("auth".into()),
            description: Some("Supabase Auth server".into()),
            url: Some("github.com/supabase/auth".into()),
            git_ref: Some("v0.0.0-missing".into()),
            yes: true,
        };
        let err = execute_go_with(
            dir.path(),
            &GlobalConfig::default(),
            options,
            &RefValidator::with_base_url(&server.uri()),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ScaffoldError>(),
            Some(ScaffoldError::UnresolvedRef { .. })
        ));
        assert!(!dir.path().join(".package-config.json").exists());
    }
}
