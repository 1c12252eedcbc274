//! # Snapshot Persistence
//!
//! The lifecycle's durable state (ledger blocks, credential records and
//! audit events) saved as one JSON document. Restoring re-runs the ledger
//! and audit integrity checks before anything is trusted.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use vca_core::Did;
use vca_crypto::IssuerIdentity;
use vca_ledger::{Ledger, LedgerBlock};
use vca_state::{CredentialRecord, InMemoryCredentialStore};

use crate::audit::{AuditEvent, AuditLog};
use crate::config::LifecycleConfig;
use crate::error::LifecycleError;
use crate::lifecycle::CredentialLifecycle;

/// Current snapshot format.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleSnapshot {
    pub format_version: u32,
    pub issuer: Did,
    pub blocks: Vec<LedgerBlock>,
    pub records: Vec<CredentialRecord>,
    pub audit: Vec<AuditEvent>,
}

impl LifecycleSnapshot {
    /// Write to `path` via a sibling temp file and rename, so a crash
    /// mid-write never leaves a truncated snapshot.
    pub fn save(&self, path: &Path) -> Result<(), LifecycleError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| LifecycleError::Snapshot(format!("serialize: {e}")))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| LifecycleError::Snapshot(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| LifecycleError::Snapshot(format!("rename to {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), blocks = self.blocks.len(), records = self.records.len(), "snapshot saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let bytes = std::fs::read(path)
            .map_err(|e| LifecycleError::Snapshot(format!("read {}: {e}", path.display())))?;
        let snapshot: Self = serde_json::from_slice(&bytes)
            .map_err(|e| LifecycleError::Snapshot(format!("parse {}: {e}", path.display())))?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(LifecycleError::Snapshot(format!(
                "unsupported snapshot format {}",
                snapshot.format_version
            )));
        }
        Ok(snapshot)
    }
}

impl CredentialLifecycle {
    /// Capture the current durable state.
    pub fn snapshot(&self) -> Result<LifecycleSnapshot, LifecycleError> {
        Ok(LifecycleSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            issuer: self.identity().did().clone(),
            blocks: self.ledger().blocks()?,
            records: self.records()?,
            audit: self.audit_log().events(),
        })
    }

    /// Rebuild a lifecycle from `snapshot`.
    ///
    /// # Errors
    ///
    /// - `LifecycleError::Snapshot` if the snapshot belongs to another
    ///   issuer or its audit chain is broken.
    /// - `LedgerError::ChainCorruption` if the blocks fail the integrity
    ///   check.
    pub fn restore(
        identity: IssuerIdentity,
        snapshot: LifecycleSnapshot,
        config: LifecycleConfig,
    ) -> Result<Self, LifecycleError> {
        if &snapshot.issuer != identity.did() {
            return Err(LifecycleError::Snapshot(format!(
                "snapshot belongs to issuer {}, not {}",
                snapshot.issuer,
                identity.did()
            )));
        }
        let ledger = Ledger::restore(snapshot.blocks, config.ledger.clone())?;
        let store = InMemoryCredentialStore::from_records(snapshot.records)?;
        let audit = AuditLog::from_events(snapshot.audit);
        let report = audit.verify_chain();
        if !report.chain_valid {
            tracing::error!(
                broken_links = report.broken_links,
                tampered_events = report.tampered_events,
                "audit chain failed verification"
            );
            return Err(LifecycleError::Snapshot(format!(
                "audit chain invalid: {} broken links, {} tampered events",
                report.broken_links, report.tampered_events
            )));
        }
        tracing::info!(
            blocks = ledger.len()?,
            records = store.len(),
            audit_events = report.total_events,
            "lifecycle restored"
        );
        Ok(CredentialLifecycle::new(identity, config)
            .with_ledger(ledger)
            .with_store(Arc::new(store))
            .with_audit_log(audit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::IssueRequest;
    use chrono::NaiveDate;
    use vca_crypto::derive_identity;
    use vca_ledger::{Difficulty, LedgerConfig};
    use vca_vc::CredentialType;

    const SEED: &[u8] = b"registrar-office-seed-0123456789";

    fn config() -> LifecycleConfig {
        LifecycleConfig {
            ledger: LedgerConfig {
                difficulty: Difficulty::new(1).unwrap(),
                ..LedgerConfig::default()
            },
            ..LifecycleConfig::default()
        }
    }

    fn populated() -> CredentialLifecycle {
        let lc = CredentialLifecycle::new(derive_identity(SEED).unwrap(), config());
        let record = lc
            .issue(IssueRequest {
                credential_type: CredentialType::Diploma,
                title: "High School Diploma".into(),
                institution: "Central High".into(),
                date_issued: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
                student_ref: None,
                subject_name: Some("Alan Turing".into()),
            })
            .unwrap();
        lc.anchor(&record.id).unwrap();
        lc.revoke(&record.id, "issued in error").unwrap();
        lc
    }

    #[test]
    fn save_and_load_round_trip() {
        let lc = populated();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let snapshot = lc.snapshot().unwrap();
        snapshot.save(&path).unwrap();

        let loaded = LifecycleSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);

        let restored =
            CredentialLifecycle::restore(derive_identity(SEED).unwrap(), loaded, config()).unwrap();
        assert_eq!(restored.records().unwrap(), lc.records().unwrap());
        assert_eq!(restored.ledger().tip().unwrap(), lc.ledger().tip().unwrap());
        assert!(restored.verify_audit_chain().chain_valid);
        assert_eq!(restored.verify_audit_chain().total_events, 3);
    }

    #[test]
    fn restore_rejects_tampered_blocks() {
        let mut snapshot = populated().snapshot().unwrap();
        snapshot.blocks[0].nonce += 1;
        let err = CredentialLifecycle::restore(derive_identity(SEED).unwrap(), snapshot, config())
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Ledger(vca_ledger::LedgerError::ChainCorruption { .. })
        ));
    }

    #[test]
    fn restore_rejects_tampered_audit() {
        let mut snapshot = populated().snapshot().unwrap();
        snapshot.audit[2].reason = Some("never happened".into());
        let err = CredentialLifecycle::restore(derive_identity(SEED).unwrap(), snapshot, config())
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Snapshot(msg) if msg.contains("audit")));
    }

    #[test]
    fn restore_rejects_other_issuer() {
        let snapshot = populated().snapshot().unwrap();
        let other = derive_identity(b"another-registrar-seed-987654321").unwrap();
        assert!(matches!(
            CredentialLifecycle::restore(other, snapshot, config()),
            Err(LifecycleError::Snapshot(_))
        ));
    }

    #[test]
    fn load_missing_file_is_snapshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LifecycleSnapshot::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LifecycleError::Snapshot(_)));
    }
}
