//! Seed configuration for monitors and per-owner ICP filters.
//!
//! Operators describe watch targets in `config/monitors.yaml`; `maglab-cli
//! seed` upserts them into the database. The engine itself never reads this
//! file — it works off the seeded rows.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use crate::types::{IcpFilters, MonitorKind};
use crate::ConfigError;

const DEFAULT_CADENCE_MINS: i32 = 360;

fn default_cadence() -> i32 {
    DEFAULT_CADENCE_MINS
}

fn default_active() -> bool {
    true
}

/// One watch target under an owner.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSeed {
    pub kind: MonitorKind,
    /// Keyword string for `keyword` monitors; company/profile URN otherwise.
    pub target: String,
    #[serde(default = "default_cadence")]
    pub cadence_mins: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// All seed state for one owner scope: optional ICP definition plus monitors.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerSeed {
    pub owner_id: Uuid,
    #[serde(default)]
    pub icp: Option<IcpFilters>,
    #[serde(default)]
    pub monitors: Vec<MonitorSeed>,
}

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub owners: Vec<OwnerSeed>,
}

/// Load and validate the monitor seed configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed_config(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed: SeedFile = serde_yaml::from_str(&content)?;

    validate_seed(&seed)?;

    Ok(seed)
}

fn validate_seed(seed: &SeedFile) -> Result<(), ConfigError> {
    let mut seen_owners = HashSet::new();

    for owner in &seed.owners {
        if !seen_owners.insert(owner.owner_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate owner_id: {}",
                owner.owner_id
            )));
        }

        let mut seen_targets = HashSet::new();
        for monitor in &owner.monitors {
            if monitor.target.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "owner {} has a monitor with an empty target",
                    owner.owner_id
                )));
            }
            if monitor.cadence_mins <= 0 {
                return Err(ConfigError::Validation(format!(
                    "monitor '{}' has non-positive cadence_mins {}",
                    monitor.target, monitor.cadence_mins
                )));
            }
            if !seen_targets.insert((monitor.kind, monitor.target.to_lowercase())) {
                return Err(ConfigError::Validation(format!(
                    "owner {} has duplicate {} monitor for '{}'",
                    owner.owner_id, monitor.kind, monitor.target
                )));
            }
        }

        if let Some(icp) = &owner.icp {
            if let Some(range) = icp.company_size_range {
                if range.min < 0 || range.max < range.min {
                    return Err(ConfigError::Validation(format!(
                        "owner {} has invalid company_size_range [{}, {}]",
                        owner.owner_id, range.min, range.max
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<(), ConfigError> {
        let seed: SeedFile = serde_yaml::from_str(yaml).map_err(ConfigError::SeedFileParse)?;
        validate_seed(&seed)
    }

    const VALID: &str = r"
owners:
  - owner_id: 1f6e29c4-7a93-4c2e-9d1a-08f2b5f7a001
    icp:
      title_keywords: [founder, ceo]
      company_size_range: { min: 11, max: 500 }
    monitors:
      - kind: keyword
        target: lead magnet
      - kind: company
        target: urn:li:organization:12345
        cadence_mins: 1440
";

    #[test]
    fn valid_seed_parses_and_validates() {
        assert!(parse(VALID).is_ok());
    }

    #[test]
    fn monitor_defaults_apply() {
        let seed: SeedFile = serde_yaml::from_str(VALID).unwrap();
        let monitors = &seed.owners[0].monitors;
        assert_eq!(monitors[0].cadence_mins, DEFAULT_CADENCE_MINS);
        assert!(monitors[0].active);
        assert_eq!(monitors[1].cadence_mins, 1440);
    }

    #[test]
    fn empty_target_is_rejected() {
        let yaml = r"
owners:
  - owner_id: 1f6e29c4-7a93-4c2e-9d1a-08f2b5f7a001
    monitors:
      - kind: keyword
        target: '  '
";
        let result = parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("empty target")),
            "got: {result:?}"
        );
    }

    #[test]
    fn duplicate_monitor_target_is_rejected() {
        let yaml = r"
owners:
  - owner_id: 1f6e29c4-7a93-4c2e-9d1a-08f2b5f7a001
    monitors:
      - kind: keyword
        target: Hiring
      - kind: keyword
        target: hiring
";
        let result = parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("duplicate")),
            "got: {result:?}"
        );
    }

    #[test]
    fn inverted_size_range_is_rejected() {
        let yaml = r"
owners:
  - owner_id: 1f6e29c4-7a93-4c2e-9d1a-08f2b5f7a001
    icp:
      company_size_range: { min: 500, max: 10 }
";
        let result = parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("company_size_range")),
            "got: {result:?}"
        );
    }

    #[test]
    fn duplicate_owner_is_rejected() {
        let yaml = r"
owners:
  - owner_id: 1f6e29c4-7a93-4c2e-9d1a-08f2b5f7a001
  - owner_id: 1f6e29c4-7a93-4c2e-9d1a-08f2b5f7a001
";
        let result = parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref m)) if m.contains("duplicate owner_id")),
            "got: {result:?}"
        );
    }
}
