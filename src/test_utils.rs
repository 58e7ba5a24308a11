//! Test utilities for property-based testing
//!
//! Generators for evaluator records and small dependency batches.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::platform::Platform;
    use crate::core::record::{BuildUnit, CacheStatus};

    /// A store path for a derivation (32 base32 characters, then a name)
    pub fn drv_path() -> impl Strategy<Value = String> {
        ("[0-9a-df-np-sv-z]{32}", "[a-z][a-z0-9-]{0,15}")
            .prop_map(|(hash, name)| format!("/nix/store/{hash}-{name}.drv"))
    }

    /// A dotted attribute name segment
    pub fn attr_segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,12}"
    }

    pub fn platform() -> impl Strategy<Value = Platform> {
        prop_oneof![
            Just(Platform::X86_64Linux),
            Just(Platform::Aarch64Linux),
            Just(Platform::Aarch64Darwin),
        ]
    }

    /// A not-built unit with no dependencies
    pub fn build_unit() -> impl Strategy<Value = BuildUnit> {
        (drv_path(), attr_segment(), platform()).prop_map(|(drv_path, name, platform)| {
            let attr_path = vec!["packages".to_string(), platform.to_string(), name.clone()];
            BuildUnit {
                attr: attr_path.join("."),
                attr_path,
                drv_path,
                name,
                system: platform.to_string(),
                cache_status: Some(CacheStatus::NotBuilt),
                needed_builds: Vec::new(),
                needed_substitutes: Vec::new(),
                required_system_features: Vec::new(),
            }
        })
    }

    /// An acyclic batch: each unit may depend only on units before it
    ///
    /// The batch is shuffled afterwards so that input order differs from
    /// dependency order.
    pub fn acyclic_batch(max: usize) -> impl Strategy<Value = Vec<BuildUnit>> {
        prop::collection::vec((build_unit(), prop::collection::vec(any::<prop::sample::Index>(), 0..4)), 1..max)
            .prop_map(|entries| {
                let mut units: Vec<BuildUnit> = Vec::with_capacity(entries.len());
                for (i, (mut unit, picks)) in entries.into_iter().enumerate() {
                    unit.drv_path = format!("/nix/store/{i:032}-{}.drv", unit.name);
                    if i > 0 {
                        unit.needed_builds = picks
                            .iter()
                            .map(|pick| units[pick.index(i)].drv_path.clone())
                            .collect();
                    }
                    units.push(unit);
                }
                units
            })
            .prop_shuffle()
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_drv_path_generator(path in drv_path()) {
            prop_assert!(path.starts_with("/nix/store/"));
            prop_assert!(path.ends_with(".drv"));
        }

        #[test]
        fn test_acyclic_batch_has_unique_paths(batch in acyclic_batch(12)) {
            let mut paths: Vec<_> = batch.iter().map(|u| u.drv_path.clone()).collect();
            paths.sort();
            paths.dedup();
            prop_assert_eq!(paths.len(), batch.len());
        }

        #[test]
        fn test_acyclic_batch_only_references_batch(batch in acyclic_batch(12)) {
            for unit in &batch {
                for dep in &unit.needed_builds {
                    prop_assert!(batch.iter().any(|u| &u.drv_path == dep));
                }
            }
        }
    }
}
