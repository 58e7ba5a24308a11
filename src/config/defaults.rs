//! Default configuration values

/// Evaluator binary
pub const EVAL_PROGRAM: &str = "nix-eval-jobs";

/// Flake reference evaluated when none is configured
pub const DEFAULT_FLAKE: &str = ".";

/// Diagnostic-channel prefixes that mark an evaluation warning
pub const WARNING_PREFIXES: &[&str] = &["evaluation warning:", "warning:"];

/// Marker that starts the core message inside an evaluation error
pub const ERROR_MARKER: &str = "error:";

/// Lines of context kept after the last error marker
pub const ERROR_CONTEXT_LINES: usize = 3;

/// Second-to-last attribute segment of a versioned extension
pub const EXTENSION_GROUP: &str = "exts";

/// Required system feature of VM test derivations
pub const NIXOS_TEST_FEATURE: &str = "nixos-test";

/// Runner labels used for placeholder matrix entries
pub const PLACEHOLDER_RUNNER: &str = "ubuntu-latest";

/// Named outputs handed to the CI sink
pub const PACKAGES_OUTPUT: &str = "packages_matrix";
pub const CHECKS_OUTPUT: &str = "checks_matrix";

/// Scaffold config file written next to the flake
pub const SCAFFOLD_CONFIG_FILE: &str = ".package-config.json";

/// Package name of the untouched scaffold template
pub const SCAFFOLD_TEMPLATE_NAME: &str = "my-go-service";

/// Placeholder vendor hash used to provoke a hash mismatch
pub const FAKE_HASH: &str = "sha256-AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// Subprocess and network timeouts (seconds)
pub const REF_CHECK_TIMEOUT: u64 = 30;
pub const PREFETCH_TIMEOUT: u64 = 300;
pub const HASH_CONVERT_TIMEOUT: u64 = 30;
pub const NIX_BUILD_TIMEOUT: u64 = 600;

/// Maximum characters of build stderr echoed on failure
pub const STDERR_TAIL: usize = 2000;

/// Upper bound on retrying a ref check (seconds)
pub const REF_CHECK_RETRY_BUDGET: u64 = 60;
