//! # Audit Log
//!
//! Every lifecycle mutation appends an [`AuditEvent`] whose hash chains to
//! the previous event, forming a tamper-evident log:
//!
//! ```text
//! event_hash = SHA-256(previous_hash ‖ sequence ‖ credential_id ‖ action ‖ reason ‖ at)
//! ```
//!
//! The first event chains to the all-zero digest.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use vca_core::{sha256_bytes, ContentDigest, CredentialId, Timestamp};

/// What happened to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Issued,
    Anchored,
    Revoked,
    RecruiterApproved,
    StudentAccepted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Anchored => "anchored",
            Self::Revoked => "revoked",
            Self::RecruiterApproved => "recruiter_approved",
            Self::StudentAccepted => "student_accepted",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub sequence: u64,
    pub credential_id: CredentialId,
    pub action: AuditAction,
    pub reason: Option<String>,
    pub at: Timestamp,
    pub previous_hash: ContentDigest,
    pub event_hash: ContentDigest,
}

impl AuditEvent {
    fn compute_hash(
        previous_hash: &ContentDigest,
        sequence: u64,
        credential_id: &CredentialId,
        action: AuditAction,
        reason: Option<&str>,
        at: &Timestamp,
    ) -> ContentDigest {
        let preimage = format!(
            "{previous_hash}{sequence}{credential_id}{action}{}{}",
            reason.unwrap_or(""),
            at.to_iso8601()
        );
        sha256_bytes(preimage.as_bytes())
    }

    /// Recompute the hash from the event's fields.
    pub fn recompute_hash(&self) -> ContentDigest {
        Self::compute_hash(
            &self.previous_hash,
            self.sequence,
            &self.credential_id,
            self.action,
            self.reason.as_deref(),
            &self.at,
        )
    }
}

/// Result of walking the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditChainReport {
    pub total_events: usize,
    /// Events whose `previous_hash` does not name the prior event.
    pub broken_links: usize,
    /// Events whose stored hash does not match their fields.
    pub tampered_events: usize,
    pub chain_valid: bool,
}

/// Append-only, hash-chained audit log. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap persisted events. Call [`AuditLog::verify_chain`] before
    /// trusting them.
    pub fn from_events(events: Vec<AuditEvent>) -> Self {
        Self {
            events: Arc::new(RwLock::new(events)),
        }
    }

    /// Append an event chained to the current head.
    pub fn append(
        &self,
        credential_id: CredentialId,
        action: AuditAction,
        reason: Option<&str>,
        at: Timestamp,
    ) -> AuditEvent {
        let mut events = self.events.write();
        let previous_hash = events
            .last()
            .map(|e| e.event_hash)
            .unwrap_or(ContentDigest::ZERO);
        let sequence = events.len() as u64;
        let event_hash =
            AuditEvent::compute_hash(&previous_hash, sequence, &credential_id, action, reason, &at);
        let event = AuditEvent {
            sequence,
            credential_id,
            action,
            reason: reason.map(str::to_string),
            at,
            previous_hash,
            event_hash,
        };
        events.push(event.clone());
        event
    }

    /// Events for one credential, oldest first.
    pub fn trail(&self, credential_id: &CredentialId) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| &e.credential_id == credential_id)
            .cloned()
            .collect()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the log checking links and recomputing hashes.
    pub fn verify_chain(&self) -> AuditChainReport {
        let events = self.events.read();
        let mut broken_links = 0;
        let mut tampered_events = 0;
        let mut expected_prev = ContentDigest::ZERO;
        for event in events.iter() {
            if event.previous_hash != expected_prev {
                broken_links += 1;
            }
            if event.recompute_hash() != event.event_hash {
                tampered_events += 1;
            }
            expected_prev = event.event_hash;
        }
        AuditChainReport {
            total_events: events.len(),
            broken_links,
            tampered_events,
            chain_valid: broken_links == 0 && tampered_events == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(1_717_243_200 + secs).unwrap()
    }

    #[test]
    fn events_chain_from_zero() {
        let log = AuditLog::new();
        let id = CredentialId::new();
        let first = log.append(id, AuditAction::Issued, None, at(0));
        let second = log.append(id, AuditAction::Revoked, Some("fraud"), at(1));
        assert_eq!(first.previous_hash, ContentDigest::ZERO);
        assert_eq!(second.previous_hash, first.event_hash);
        assert_eq!(second.sequence, 1);
        assert!(log.verify_chain().chain_valid);
    }

    #[test]
    fn trail_filters_by_credential() {
        let log = AuditLog::new();
        let a = CredentialId::new();
        let b = CredentialId::new();
        log.append(a, AuditAction::Issued, None, at(0));
        log.append(b, AuditAction::Issued, None, at(1));
        log.append(a, AuditAction::Anchored, None, at(2));
        let trail: Vec<_> = log.trail(&a).into_iter().map(|e| e.action).collect();
        assert_eq!(trail, vec![AuditAction::Issued, AuditAction::Anchored]);
    }

    #[test]
    fn edited_reason_is_detected() {
        let log = AuditLog::new();
        let id = CredentialId::new();
        log.append(id, AuditAction::Revoked, Some("fraud"), at(0));
        let mut events = log.events();
        events[0].reason = Some("clerical".into());
        let report = AuditLog::from_events(events).verify_chain();
        assert_eq!(report.tampered_events, 1);
        assert!(!report.chain_valid);
    }

    #[test]
    fn removed_event_breaks_link() {
        let log = AuditLog::new();
        let id = CredentialId::new();
        for i in 0..3 {
            log.append(id, AuditAction::Issued, None, at(i));
        }
        let mut events = log.events();
        events.remove(1);
        let report = AuditLog::from_events(events).verify_chain();
        assert_eq!(report.broken_links, 1);
        assert!(!report.chain_valid);
    }
}
