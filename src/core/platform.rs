//! Supported target platforms and their CI runners

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A nix system the matrix knows how to build for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "x86_64-linux")]
    X86_64Linux,
    #[serde(rename = "aarch64-linux")]
    Aarch64Linux,
    #[serde(rename = "aarch64-darwin")]
    Aarch64Darwin,
}

impl Platform {
    /// Every supported platform, in declaration order
    pub const ALL: [Self; 3] = [Self::X86_64Linux, Self::Aarch64Linux, Self::Aarch64Darwin];

    /// The nix system string (`x86_64-linux`)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64Linux => "x86_64-linux",
            Self::Aarch64Linux => "aarch64-linux",
            Self::Aarch64Darwin => "aarch64-darwin",
        }
    }

    /// Matrix key form: hyphens replaced by underscores
    pub fn matrix_key(self) -> String {
        self.as_str().replace('-', "_")
    }

    /// Runner labels for builds on this platform
    pub fn runner_labels(self) -> &'static [&'static str] {
        match self {
            Self::X86_64Linux => &["blacksmith-8vcpu-ubuntu-2404"],
            Self::Aarch64Linux => &["blacksmith-8vcpu-ubuntu-2404-arm"],
            Self::Aarch64Darwin => &["macos-latest"],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for a system string outside [`Platform::ALL`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_system_strings() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(platform));
        }
    }

    #[test]
    fn test_unknown_system_is_rejected() {
        assert_eq!(
            "riscv64-linux".parse::<Platform>(),
            Err(UnknownPlatform("riscv64-linux".to_string()))
        );
    }

    #[test]
    fn test_matrix_key_uses_underscores() {
        assert_eq!(Platform::X86_64Linux.matrix_key(), "x86_64_linux");
        assert_eq!(Platform::Aarch64Darwin.matrix_key(), "aarch64_darwin");
    }

    #[test]
    fn test_every_platform_has_runner_labels() {
        for platform in Platform::ALL {
            assert!(!platform.runner_labels().is_empty());
        }
    }
}
