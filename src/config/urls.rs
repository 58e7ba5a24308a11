//! Remote endpoints

/// Base for GitHub source archives (`<base>/<owner>/<repo>/archive/<ref>.tar.gz`)
pub const GITHUB_ARCHIVE: &str = "https://github.com";
