//! GitHub Actions workflow commands
//!
//! Writes annotations as `::<kind> title=<title>::<message>` lines and named
//! outputs to the file in `GITHUB_OUTPUT`, falling back to the legacy
//! `::set-output` command when that variable is unset.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::core::diagnostics::{AnnotationKind, AnnotationSink};

/// Environment variable naming the step output file
pub const ENV_GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Sink that speaks the workflow command protocol
pub struct GithubActions<W: Write> {
    out: W,
    output_file: Option<PathBuf>,
}

impl GithubActions<io::Stdout> {
    /// Commands to stdout, outputs to `$GITHUB_OUTPUT` when set
    pub fn from_env() -> Self {
        Self::new(
            io::stdout(),
            std::env::var_os(ENV_GITHUB_OUTPUT).map(PathBuf::from),
        )
    }
}

impl<W: Write> GithubActions<W> {
    pub fn new(out: W, output_file: Option<PathBuf>) -> Self {
        Self { out, output_file }
    }

    /// The underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Escape a command's message part
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property value
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Data escaping that leaves already-escaped `%XX` sequences alone
fn escape_message(message: &str) -> String {
    message.replace('\r', "%0D").replace('\n', "%0A")
}

impl<W: Write> AnnotationSink for GithubActions<W> {
    fn report(&mut self, kind: AnnotationKind, message: &str, title: Option<&str>) -> io::Result<()> {
        let message = escape_message(message);
        match title {
            Some(title) => writeln!(self.out, "::{kind} title={}::{message}", escape_property(title)),
            None => writeln!(self.out, "::{kind}::{message}"),
        }
    }

    fn emit(&mut self, name: &str, value: &str) -> io::Result<()> {
        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                if value.contains('\n') {
                    let delimiter = format!("ghadelimiter_{}", std::process::id());
                    writeln!(file, "{name}<<{delimiter}\n{value}\n{delimiter}")
                } else {
                    writeln!(file, "{name}={value}")
                }
            }
            None => writeln!(self.out, "::set-output name={name}::{}", escape_data(value)),
        }
    }
}
