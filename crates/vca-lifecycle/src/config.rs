//! # Lifecycle Configuration

use serde::{Deserialize, Serialize};

use vca_ledger::LedgerConfig;

/// What `anchor` does with a record that already has an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReanchorPolicy {
    /// Mine a fresh block and replace the stored anchor.
    #[default]
    MineNew,
    /// Fail with `AlreadyAnchored`.
    Reject,
}

/// How `verify` treats the stored anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorCheck {
    /// Report the stored anchor as-is.
    #[default]
    TrustStore,
    /// Look the anchored block up in the ledger and confirm it carries the
    /// credential hash.
    Reconfirm,
}

impl std::str::FromStr for ReanchorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mine-new" => Ok(Self::MineNew),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown re-anchor policy {other:?} (expected mine-new or reject)"
            )),
        }
    }
}

impl std::str::FromStr for AnchorCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "trust-store" => Ok(Self::TrustStore),
            "reconfirm" => Ok(Self::Reconfirm),
            other => Err(format!(
                "unknown anchor check {other:?} (expected trust-store or reconfirm)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LifecycleConfig {
    pub ledger: LedgerConfig,
    pub reanchor: ReanchorPolicy,
    pub anchor_check: AnchorCheck,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_reference_behavior() {
        let config = LifecycleConfig::default();
        assert_eq!(config.reanchor, ReanchorPolicy::MineNew);
        assert_eq!(config.anchor_check, AnchorCheck::TrustStore);
        assert_eq!(config.ledger.difficulty.zeros(), 3);
    }

    #[test]
    fn policies_parse() {
        assert_eq!("reject".parse::<ReanchorPolicy>(), Ok(ReanchorPolicy::Reject));
        assert_eq!("reconfirm".parse::<AnchorCheck>(), Ok(AnchorCheck::Reconfirm));
        assert!("sometimes".parse::<ReanchorPolicy>().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: LifecycleConfig =
            serde_json::from_str(r#"{"reanchor":"reject","ledger":{"difficulty":2}}"#).unwrap();
        assert_eq!(config.reanchor, ReanchorPolicy::Reject);
        assert_eq!(config.anchor_check, AnchorCheck::TrustStore);
        assert_eq!(config.ledger.difficulty.zeros(), 2);
        assert_eq!(config.ledger.max_append_retries, 8);
    }
}
