//! Unit classification
//!
//! Maps a [`BuildUnit`] to the entry a CI matrix consumes: platform, runner
//! labels and, for PostgreSQL extensions, the major version taken from the
//! attribute path.

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::platform::Platform;
use crate::core::record::BuildUnit;
use crate::error::ClassifyError;

/// `runs-on` value of a matrix entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunsOn {
    pub labels: Vec<String>,
}

impl RunsOn {
    /// Runners for builds on `platform`
    pub fn for_platform(platform: Platform) -> Self {
        Self::from_labels(platform.runner_labels())
    }

    /// Build from static labels
    pub fn from_labels(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(ToString::to_string).collect(),
        }
    }
}

/// One matrix entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedUnit {
    /// Dotted attribute; empty for placeholders
    #[serde(rename = "attr")]
    pub attr_path: String,
    pub name: String,
    #[serde(rename = "system")]
    pub platform: Platform,
    #[serde(rename = "runs_on")]
    pub runner_labels: RunsOn,
    /// Major version of an extension's PostgreSQL
    #[serde(
        rename = "postgresql_version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub extracted_version: Option<String>,
}

/// Whether the unit lives under an `exts` attribute set
pub fn is_extension(unit: &BuildUnit) -> bool {
    let segments = unit.segments();
    segments.len() >= 2 && segments[segments.len() - 2] == defaults::EXTENSION_GROUP
}

/// Version suffix of the segment three from the end (`postgresql_15` -> `15`)
pub fn extension_version(unit: &BuildUnit) -> Option<String> {
    if !is_extension(unit) {
        return None;
    }
    let segments = unit.segments();
    let owner = segments.len().checked_sub(3).map(|i| segments[i])?;
    owner.rsplit('_').next().map(str::to_string)
}

/// Classify a unit for the matrix
///
/// A system without a runner entry is a configuration defect and fails
/// the whole run.
pub fn classify(unit: &BuildUnit) -> Result<ClassifiedUnit, ClassifyError> {
    let platform: Platform = unit
        .system
        .parse()
        .map_err(|_| ClassifyError::NoRunner {
            system: unit.system.clone(),
            attr: unit.attr.clone(),
        })?;

    Ok(ClassifiedUnit {
        attr_path: unit.attr.clone(),
        name: unit.name.clone(),
        platform,
        runner_labels: RunsOn::for_platform(platform),
        extracted_version: extension_version(unit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &[&str], system: &str) -> BuildUnit {
        BuildUnit {
            attr: path.join("."),
            attr_path: path.iter().map(ToString::to_string).collect(),
            drv_path: format!("/nix/store/{}.drv", path.join("-")),
            name: path.last().unwrap().to_string(),
            system: system.to_string(),
            cache_status: None,
            needed_builds: Vec::new(),
            needed_substitutes: Vec::new(),
            required_system_features: Vec::new(),
        }
    }

    #[test]
    fn test_classify_assigns_runner() {
        let classified = classify(&unit(&["packages", "aarch64-linux", "foo"], "aarch64-linux")).unwrap();
        assert_eq!(classified.platform, Platform::Aarch64Linux);
        assert_eq!(classified.runner_labels.labels, vec!["blacksmith-8vcpu-ubuntu-2404-arm"]);
        assert_eq!(classified.extracted_version, None);
    }

    #[test]
    fn test_extension_version_is_extracted() {
        let u = unit(&["packages", "x86_64-linux", "postgresql_15", "exts", "foo"], "x86_64-linux");
        assert!(is_extension(&u));
        assert_eq!(classify(&u).unwrap().extracted_version.as_deref(), Some("15"));
    }

    #[test]
    fn test_segment_without_underscore_yields_whole_segment() {
        let u = unit(&["packages", "x86_64-linux", "orioledb", "exts", "foo"], "x86_64-linux");
        assert_eq!(extension_version(&u).as_deref(), Some("orioledb"));
    }

    #[test]
    fn test_short_attribute_paths_are_not_extensions() {
        assert!(!is_extension(&unit(&["foo"], "x86_64-linux")));
        let u = unit(&["exts", "foo"], "x86_64-linux");
        assert!(is_extension(&u));
        assert_eq!(extension_version(&u), None);
    }

    #[test]
    fn test_unknown_system_is_fatal() {
        let err = classify(&unit(&["packages", "riscv64-linux", "foo"], "riscv64-linux")).unwrap_err();
        assert!(err.to_string().contains("riscv64-linux"));
    }

    #[test]
    fn test_serialized_field_names() {
        let u = unit(&["packages", "x86_64-linux", "postgresql_17", "exts", "bar"], "x86_64-linux");
        let value = serde_json::to_value(classify(&u).unwrap()).unwrap();
        assert_eq!(value["attr"], "packages.x86_64-linux.postgresql_17.exts.bar");
        assert_eq!(value["system"], "x86_64-linux");
        assert_eq!(value["runs_on"]["labels"][0], "blacksmith-8vcpu-ubuntu-2404");
        assert_eq!(value["postgresql_version"], "17");
    }
}
