//! Matrix assembly
//!
//! Groups not-yet-built units into the `packages` and `checks` matrices,
//! keyed per platform, and pads every platform without work with a
//! placeholder entry so no matrix axis is ever empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::core::classify::{classify, ClassifiedUnit, RunsOn};
use crate::core::platform::Platform;
use crate::core::record::BuildUnit;
use crate::error::ClassifyError;

/// Top-level flake output a unit is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildGroup {
    Packages,
    Checks,
}

impl BuildGroup {
    /// Route by the first attribute segment; anything else is not built
    pub fn of(unit: &BuildUnit) -> Option<Self> {
        match unit.segments().first().copied() {
            Some("packages") => Some(Self::Packages),
            Some("checks") => Some(Self::Checks),
            _ => None,
        }
    }

    fn placeholder_name(self) -> &'static str {
        match self {
            Self::Packages => "no packages to build",
            Self::Checks => "no checks to build",
        }
    }
}

/// `{ "include": [...] }` for one platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixAxis {
    pub include: Vec<ClassifiedUnit>,
}

/// Platform key (`x86_64_linux`) -> entries
pub type GroupMatrix = BTreeMap<String, MatrixAxis>;

/// The generated build matrix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub packages: GroupMatrix,
    pub checks: GroupMatrix,
}

impl Matrix {
    fn group_mut(&mut self, group: BuildGroup) -> &mut GroupMatrix {
        match group {
            BuildGroup::Packages => &mut self.packages,
            BuildGroup::Checks => &mut self.checks,
        }
    }

    /// Entries of `group` for `platform`
    pub fn entries(&self, group: BuildGroup, platform: Platform) -> &[ClassifiedUnit] {
        let matrix = match group {
            BuildGroup::Packages => &self.packages,
            BuildGroup::Checks => &self.checks,
        };
        matrix
            .get(&platform.matrix_key())
            .map(|axis| axis.include.as_slice())
            .unwrap_or_default()
    }

    /// Number of real (non-placeholder) entries across both groups
    pub fn job_count(&self) -> usize {
        self.packages
            .values()
            .chain(self.checks.values())
            .flat_map(|axis| &axis.include)
            .filter(|entry| !entry.attr_path.is_empty())
            .count()
    }
}

/// Placeholder entry for a platform with nothing to build
pub fn placeholder(group: BuildGroup, platform: Platform) -> ClassifiedUnit {
    ClassifiedUnit {
        attr_path: String::new(),
        name: group.placeholder_name().to_string(),
        platform,
        runner_labels: RunsOn::from_labels(&[defaults::PLACEHOLDER_RUNNER]),
        extracted_version: None,
    }
}

/// Assemble the matrix from closure-ordered units
///
/// Only not-built units under `packages.` or `checks.` become entries, in
/// the order given. Every platform in `platforms` gets at least one entry
/// in both groups.
pub fn assemble(units: &[BuildUnit], platforms: &[Platform]) -> Result<Matrix, ClassifyError> {
    let mut matrix = Matrix::default();

    for unit in units.iter().filter(|u| u.is_not_built()) {
        let entry = classify(unit)?;
        let Some(group) = BuildGroup::of(unit) else {
            tracing::trace!("Not routing {} into the matrix", unit.attr);
            continue;
        };
        matrix
            .group_mut(group)
            .entry(entry.platform.matrix_key())
            .or_default()
            .include
            .push(entry);
    }

    for group in [BuildGroup::Packages, BuildGroup::Checks] {
        for &platform in platforms {
            let axis = matrix.group_mut(group).entry(platform.matrix_key()).or_default();
            if axis.include.is_empty() {
                axis.include.push(placeholder(group, platform));
            }
        }
    }

    Ok(matrix)
}
