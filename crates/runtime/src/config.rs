// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! revision = 200
//! unit_count = 8
//! buffer_capacity = "16K"
//! split_policy = "remainder-first"
//! min_elements_per_unit = 1
//! queue_depth = 2
//! launch_timeout_ms = 30000
//! enable_profiling = true
//! ```

use crate::RuntimeError;
use capability::{revision, HardwareProfile};
use staging::StagingCapacity;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tiling_planner::{policy_by_name, SplitPolicy, DEFAULT_QUEUE_DEPTH};

/// Configuration for the kernel runtime.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Hardware revision id; selects the capability row.
    pub revision: u32,
    /// Parallel execution units.
    pub unit_count: usize,
    /// Per-unit staging capacity in elements (e.g. `"16K"`).
    pub buffer_capacity: StagingCapacity,
    /// Split policy name: `"remainder-first"`, `"remainder-last"`, `"distinct-tail"`.
    #[serde(default = "default_policy")]
    pub split_policy: String,
    /// Minimum elements per active unit.
    #[serde(default = "default_min_elements")]
    pub min_elements_per_unit: usize,
    /// Staging queue depth (2 = double buffering).
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// How long a launch may run before the caller stops waiting.
    /// `None` waits indefinitely; TOML writes it as `0`.
    #[serde(
        default = "default_timeout",
        serialize_with = "serialize_timeout",
        deserialize_with = "deserialize_timeout"
    )]
    pub launch_timeout_ms: Option<u64>,
    /// Whether to log per-invocation metrics at `info`.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_policy() -> String {
    "remainder-first".to_string()
}

fn default_min_elements() -> usize {
    1
}

fn default_queue_depth() -> usize {
    DEFAULT_QUEUE_DEPTH
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> Option<u64> {
    Some(30_000)
}

fn serialize_timeout<S: serde::Serializer>(ms: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(ms.unwrap_or(0))
}

fn deserialize_timeout<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    let ms = <u64 as serde::Deserialize>::deserialize(d)?;
    Ok((ms > 0).then_some(ms))
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Rejects values no launch could use.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.queue_depth == 0 {
            return Err(RuntimeError::ConfigError("queue_depth must be at least 1".into()));
        }
        if self.min_elements_per_unit == 0 {
            return Err(RuntimeError::ConfigError(
                "min_elements_per_unit must be at least 1".into(),
            ));
        }
        self.hardware_profile()?;
        self.create_policy()?;
        Ok(())
    }

    /// Builds the hardware profile described by this config.
    pub fn hardware_profile(&self) -> Result<HardwareProfile, RuntimeError> {
        HardwareProfile::new(self.revision, self.unit_count, self.buffer_capacity.elements())
            .map_err(|e| RuntimeError::ConfigError(e.to_string()))
    }

    /// Creates the split policy named by this config.
    pub fn create_policy(&self) -> Result<Arc<dyn SplitPolicy>, RuntimeError> {
        policy_by_name(&self.split_policy)
            .map(Arc::from)
            .map_err(|e| {
                RuntimeError::ConfigError(format!(
                    "{e}; expected 'remainder-first', 'remainder-last', or 'distinct-tail'"
                ))
            })
    }

    /// The launch timeout, if any. Zero counts as none.
    pub fn launch_timeout(&self) -> Option<Duration> {
        self.launch_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            revision: revision::GEN2,
            unit_count: HardwareProfile::default().unit_count(),
            buffer_capacity: StagingCapacity::DEFAULT,
            split_policy: default_policy(),
            min_elements_per_unit: default_min_elements(),
            queue_depth: default_queue_depth(),
            launch_timeout_ms: default_timeout(),
            enable_profiling: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = RuntimeConfig::default();
        assert_eq!(c.revision, revision::GEN2);
        assert_eq!(c.unit_count, 8);
        assert_eq!(c.buffer_capacity.elements(), 16 * 1024);
        assert_eq!(c.split_policy, "remainder-first");
        assert_eq!(c.queue_depth, 2);
        c.validate().unwrap();
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
revision = 100
unit_count = 4
buffer_capacity = "8K"
split_policy = "distinct-tail"
queue_depth = 1
launch_timeout_ms = 500
enable_profiling = false
"#;
        let c = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(c.revision, 100);
        assert_eq!(c.unit_count, 4);
        assert_eq!(c.buffer_capacity.elements(), 8192);
        assert_eq!(c.create_policy().unwrap().name(), "distinct-tail");
        assert_eq!(c.queue_depth, 1);
        assert_eq!(c.launch_timeout(), Some(Duration::from_millis(500)));
        assert!(!c.enable_profiling);
    }

    #[test]
    fn test_from_toml_defaults() {
        let c = RuntimeConfig::from_toml("revision = 300\nunit_count = 2\nbuffer_capacity = 64\n")
            .unwrap();
        assert_eq!(c.buffer_capacity.elements(), 64);
        assert_eq!(c.min_elements_per_unit, 1);
        assert_eq!(c.queue_depth, 2);
        assert_eq!(c.launch_timeout(), Some(Duration::from_secs(30)));
        assert!(c.enable_profiling);
    }

    #[test]
    fn test_minimal_toml_matches_default_timeout() {
        let c = RuntimeConfig::from_toml("revision = 200\nunit_count = 8\nbuffer_capacity = \"16K\"")
            .unwrap();
        assert_eq!(c.launch_timeout_ms, RuntimeConfig::default().launch_timeout_ms);
        assert_eq!(c, RuntimeConfig::default());
    }

    #[test]
    fn test_zero_timeout_waits_forever() {
        let c = RuntimeConfig::from_toml(
            "revision = 200\nunit_count = 8\nbuffer_capacity = 16\nlaunch_timeout_ms = 0\n",
        )
        .unwrap();
        assert_eq!(c.launch_timeout(), None);

        let toml = c.to_toml().unwrap();
        assert!(toml.contains("launch_timeout_ms = 0"));
        assert_eq!(RuntimeConfig::from_toml(&toml).unwrap(), c);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = RuntimeConfig::default();
        let toml = c.to_toml().unwrap();
        assert!(toml.contains("buffer_capacity = \"16K\""));
        let back = RuntimeConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_invalid_values() {
        let bad_policy = RuntimeConfig {
            split_policy: "round-robin".into(),
            ..Default::default()
        };
        assert!(matches!(bad_policy.create_policy(), Err(RuntimeError::ConfigError(_))));

        let zero_units = RuntimeConfig {
            unit_count: 0,
            ..Default::default()
        };
        assert!(zero_units.hardware_profile().is_err());

        assert!(RuntimeConfig::from_toml("revision = 200\nunit_count = 8\nbuffer_capacity = \"0K\"\n").is_err());
        assert!(RuntimeConfig::from_toml("revision = 200\nunit_count = 8\nbuffer_capacity = 16\nqueue_depth = 0\n").is_err());
    }

    #[test]
    fn test_hardware_profile() {
        let c = RuntimeConfig {
            revision: revision::GEN3,
            unit_count: 48,
            ..Default::default()
        };
        let p = c.hardware_profile().unwrap();
        assert_eq!(p.revision(), revision::GEN3);
        assert_eq!(p.unit_count(), 48);
    }
}
