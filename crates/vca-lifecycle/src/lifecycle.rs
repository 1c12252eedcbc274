//! # Credential Lifecycle
//!
//! Composes key material, signer, ledger, repository, resolver and audit
//! log into the six credential operations plus the disclosure read path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use vca_core::{sha256_bytes, Clock, ContentDigest, CredentialId, SystemClock, Timestamp};
use vca_crypto::IssuerIdentity;
use vca_ledger::{ChainReport, Ledger, LedgerError};
use vca_state::{
    AnchorRef, CredentialError, CredentialRecord, CredentialRepository, CredentialView,
    Disclosure, InMemoryCredentialStore, NewCredential,
};
use vca_vc::{decode_and_verify, CredentialPayload, CredentialType, VcSigner};

use crate::audit::{AuditAction, AuditChainReport, AuditEvent, AuditLog};
use crate::config::{AnchorCheck, LifecycleConfig, ReanchorPolicy};
use crate::error::LifecycleError;
use crate::resolver::{IdentityResolver, InMemoryDirectory, SubjectResolution};

/// Input to [`CredentialLifecycle::issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub credential_type: CredentialType,
    pub title: String,
    pub institution: String,
    pub date_issued: NaiveDate,
    /// Internal id or username of the subject.
    pub student_ref: Option<String>,
    /// Subject name for anonymous issuance.
    pub subject_name: Option<String>,
}

/// Outcome of [`CredentialLifecycle::verify`].
///
/// An unknown hash serializes as `{"exists":false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub credential: Option<CredentialView>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor: Option<AnchorRef>,
    /// The stored token hashes to the looked-up value and its signature
    /// verifies against the issuer key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature_valid: Option<bool>,
    /// Set only under [`AnchorCheck::Reconfirm`].
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor_confirmed: Option<bool>,
}

impl VerificationResult {
    fn absent() -> Self {
        Self {
            exists: false,
            credential: None,
            anchor: None,
            signature_valid: None,
            anchor_confirmed: None,
        }
    }
}

/// The credential lifecycle.
pub struct CredentialLifecycle {
    identity: Arc<IssuerIdentity>,
    signer: VcSigner,
    ledger: Ledger,
    store: Arc<dyn CredentialRepository>,
    resolver: Arc<dyn IdentityResolver>,
    audit: AuditLog,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
    /// One lock per record with an `anchor` in flight.
    anchor_slots: Mutex<HashMap<CredentialId, Arc<Mutex<()>>>>,
    /// Set when the ledger fails an integrity check.
    anchoring_halted: AtomicBool,
}

impl std::fmt::Debug for CredentialLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialLifecycle")
            .field("issuer", self.identity.did())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CredentialLifecycle {
    /// In-memory lifecycle with the system clock and an empty directory.
    pub fn new(identity: IssuerIdentity, config: LifecycleConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            identity: Arc::new(identity),
            signer: VcSigner::new(Arc::clone(&clock)),
            ledger: Ledger::new(config.ledger.clone()),
            store: Arc::new(InMemoryCredentialStore::new()),
            resolver: Arc::new(InMemoryDirectory::new()),
            audit: AuditLog::new(),
            clock,
            config,
            anchor_slots: Mutex::new(HashMap::new()),
            anchoring_halted: AtomicBool::new(false),
        }
    }

    /// Use `clock` for issued-at and event timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.signer = VcSigner::new(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CredentialRepository>) -> Self {
        self.store = store;
        self
    }

    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn identity(&self) -> &IssuerIdentity {
        &self.identity
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub(crate) fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    // -- Write operations ---------------------------------------------------

    /// Sign and persist a new credential.
    ///
    /// The record starts `verified`, unanchored, with both consent flags
    /// false. An unresolvable subject falls back to anonymous issuance.
    pub fn issue(&self, request: IssueRequest) -> Result<CredentialRecord, LifecycleError> {
        let resolution = SubjectResolution::resolve(
            self.resolver.as_ref(),
            request.student_ref.as_deref(),
            request.subject_name.as_deref(),
        );
        if resolution.is_anonymous() {
            tracing::warn!(
                student_ref = ?request.student_ref,
                "subject not found in directory; issuing anonymously"
            );
        }

        let payload = CredentialPayload::new(
            resolution.subject(),
            self.identity.did().clone(),
            request.credential_type,
            request.title,
            request.institution,
            request.date_issued,
        )?;
        let signed = self.signer.sign(&payload, &self.identity)?;
        let subject = payload.subject();

        let now = self.clock.now();
        let record = CredentialRecord::issued(
            NewCredential {
                id: CredentialId::new(),
                title: payload.title().to_string(),
                credential_type: payload.credential_type(),
                institution: payload.institution().to_string(),
                date_issued: payload.date_issued(),
                student_id: resolution.student_id().cloned(),
                subject_ref: subject.id.clone(),
                subject_name: subject.name.clone(),
                vc_token: signed.token,
                vc_hash: signed.hash,
            },
            now,
        );
        self.store.insert(record.clone())?;
        self.audit.append(record.id, AuditAction::Issued, None, now);

        tracing::info!(
            credential_id = %record.id,
            credential_type = %record.credential_type,
            vc_hash = %signed.hash,
            anonymous = resolution.is_anonymous(),
            "credential issued"
        );
        Ok(record)
    }

    /// Append the credential hash to the ledger and record the block.
    ///
    /// Anchoring one record is serialized: a second call for the same id
    /// waits, then sees the first call's anchor. Under
    /// [`ReanchorPolicy::Reject`] it fails with `AlreadyAnchored`; under
    /// [`ReanchorPolicy::MineNew`] it mines a new block and the record keeps
    /// the highest one.
    pub fn anchor(&self, id: &CredentialId) -> Result<CredentialRecord, LifecycleError> {
        if self.is_anchoring_halted() {
            tracing::error!(credential_id = %id, "anchor refused; ledger integrity check failed");
            return Err(LifecycleError::AnchoringHalted);
        }
        let slot = self.claim_anchor_slot(id);
        let result = {
            let _guard = slot.lock();
            self.anchor_exclusive(id)
        };
        self.release_anchor_slot(id, slot);
        result
    }

    fn anchor_exclusive(&self, id: &CredentialId) -> Result<CredentialRecord, LifecycleError> {
        let record = self.get(id)?;
        let hash = record.vc_hash.ok_or(LifecycleError::MissingHash(*id))?;

        let replace_existing = match (record.anchor, self.config.reanchor) {
            (None, _) => false,
            (Some(existing), ReanchorPolicy::Reject) => {
                return Err(LifecycleError::AlreadyAnchored {
                    id: *id,
                    block_height: existing.block_height,
                });
            }
            (Some(existing), ReanchorPolicy::MineNew) => {
                tracing::warn!(
                    credential_id = %id,
                    previous_height = existing.block_height,
                    "credential already anchored; mining a new block"
                );
                true
            }
        };

        let block = self.ledger.append(hash)?;
        let anchor = AnchorRef {
            block_height: block.height,
            block_hash: block.hash,
        };
        // Re-checked under the record's write lock: the repository can be
        // shared with another lifecycle.
        let mut stored = false;
        let updated = self
            .store
            .try_update(id, &mut |r| {
                stored = r.attach_anchor(anchor, replace_existing)?;
                Ok(())
            })
            .map_err(|e| match e {
                CredentialError::AlreadyAnchored { id, block_height } => {
                    tracing::warn!(
                        credential_id = %id,
                        existing_height = block_height,
                        unused_height = block.height,
                        "record anchored concurrently; new block left unreferenced"
                    );
                    LifecycleError::AlreadyAnchored { id, block_height }
                }
                other => other.into(),
            })?;

        if !stored {
            tracing::debug!(
                credential_id = %id,
                height = block.height,
                "record already points at a higher block"
            );
            return Ok(updated);
        }
        self.audit
            .append(*id, AuditAction::Anchored, None, self.clock.now());

        tracing::info!(
            credential_id = %id,
            height = block.height,
            block_hash = %block.hash,
            "credential anchored"
        );
        Ok(updated)
    }

    fn claim_anchor_slot(&self, id: &CredentialId) -> Arc<Mutex<()>> {
        Arc::clone(self.anchor_slots.lock().entry(*id).or_default())
    }

    fn release_anchor_slot(&self, id: &CredentialId, slot: Arc<Mutex<()>>) {
        let mut slots = self.anchor_slots.lock();
        drop(slot);
        if slots.get(id).is_some_and(|s| Arc::strong_count(s) == 1) {
            slots.remove(id);
        }
    }

    /// Whether anchoring is stopped after a failed integrity check.
    pub fn is_anchoring_halted(&self) -> bool {
        self.anchoring_halted.load(Ordering::Acquire)
    }

    /// Revoke unconditionally. Irreversible; revoking twice leaves the
    /// status unchanged but is still audited.
    pub fn revoke(&self, id: &CredentialId, reason: &str) -> Result<CredentialRecord, LifecycleError> {
        let now = self.clock.now();
        let mut changed = false;
        let updated = self.store.try_update(id, &mut |r| {
            changed = r.revoke(reason, now)?;
            Ok(())
        })?;
        self.audit.append(*id, AuditAction::Revoked, Some(reason), now);

        if changed {
            tracing::info!(credential_id = %id, %reason, "credential revoked");
        } else {
            tracing::debug!(credential_id = %id, %reason, "credential already revoked");
        }
        Ok(updated)
    }

    /// Record the inspecting party's approval. One-way.
    pub fn approve_visibility(&self, id: &CredentialId) -> Result<CredentialRecord, LifecycleError> {
        self.flip_consent(id, AuditAction::RecruiterApproved, CredentialRecord::approve_visibility)
    }

    /// Record the subject's acceptance. One-way.
    pub fn accept_visibility(&self, id: &CredentialId) -> Result<CredentialRecord, LifecycleError> {
        self.flip_consent(id, AuditAction::StudentAccepted, CredentialRecord::accept_visibility)
    }

    fn flip_consent(
        &self,
        id: &CredentialId,
        action: AuditAction,
        flip: fn(&mut CredentialRecord, Timestamp) -> bool,
    ) -> Result<CredentialRecord, LifecycleError> {
        let now = self.clock.now();
        let mut changed = false;
        let updated = self.store.try_update(id, &mut |r| {
            changed = flip(r, now);
            Ok(())
        })?;
        if changed {
            self.audit.append(*id, action, None, now);
            tracing::info!(
                credential_id = %id,
                %action,
                disclosable = updated.is_disclosable(),
                "consent recorded"
            );
        }
        Ok(updated)
    }

    // -- Read operations ----------------------------------------------------

    /// Look a credential up by hash. Never mutates state; an unknown or
    /// unparseable hash yields `exists: false`.
    pub fn verify(&self, hash: &str) -> Result<VerificationResult, LifecycleError> {
        let Ok(digest) = hash.trim().parse::<ContentDigest>() else {
            tracing::debug!(%hash, "verify: not a SHA-256 hex digest");
            return Ok(VerificationResult::absent());
        };
        let Some(record) = self.store.find_by_hash(&digest)? else {
            tracing::debug!(%digest, "verify: unknown hash");
            return Ok(VerificationResult::absent());
        };

        let signature_valid = sha256_bytes(record.vc_token.as_bytes()) == digest
            && decode_and_verify(&record.vc_token, self.identity.public_key()).is_ok();
        let anchor_confirmed = match self.config.anchor_check {
            AnchorCheck::TrustStore => None,
            AnchorCheck::Reconfirm => Some(self.reconfirm_anchor(&record, &digest)?),
        };

        Ok(VerificationResult {
            exists: true,
            credential: Some(CredentialView::from(&record)),
            anchor: record.anchor,
            signature_valid: Some(signature_valid),
            anchor_confirmed,
        })
    }

    fn reconfirm_anchor(
        &self,
        record: &CredentialRecord,
        digest: &ContentDigest,
    ) -> Result<bool, LifecycleError> {
        let Some(anchor) = record.anchor else {
            return Ok(false);
        };
        let confirmed = self
            .ledger
            .block_at(anchor.block_height)?
            .map(|b| b.hash == anchor.block_hash && &b.payload_hash == digest && b.hash_is_consistent())
            .unwrap_or(false);
        if !confirmed {
            tracing::warn!(
                credential_id = %record.id,
                height = anchor.block_height,
                "stored anchor not confirmed by the ledger"
            );
        }
        Ok(confirmed)
    }

    /// Apply the dual-consent gate to one record.
    pub fn disclose(&self, id: &CredentialId) -> Result<Disclosure, LifecycleError> {
        Ok(self.get(id)?.disclose())
    }

    /// Every record that passes the disclosure gate.
    pub fn disclosable(&self) -> Result<Vec<CredentialView>, LifecycleError> {
        Ok(self
            .store
            .list()?
            .iter()
            .filter(|r| r.is_disclosable())
            .map(CredentialView::from)
            .collect())
    }

    pub fn get(&self, id: &CredentialId) -> Result<CredentialRecord, LifecycleError> {
        self.store
            .get(id)?
            .ok_or_else(|| LifecycleError::not_found(*id))
    }

    pub fn records(&self) -> Result<Vec<CredentialRecord>, LifecycleError> {
        Ok(self.store.list()?)
    }

    pub fn audit_trail(&self, id: &CredentialId) -> Vec<AuditEvent> {
        self.audit.trail(id)
    }

    pub fn verify_audit_chain(&self) -> AuditChainReport {
        self.audit.verify_chain()
    }

    /// Walk the ledger from genesis to tip.
    ///
    /// `ChainCorruption` halts anchoring until a later call passes.
    pub fn verify_ledger(&self) -> Result<ChainReport, LifecycleError> {
        match self.ledger.verify_integrity() {
            Ok(report) => {
                if self.anchoring_halted.swap(false, Ordering::AcqRel) {
                    tracing::info!(blocks = report.blocks, "ledger verified; anchoring resumed");
                }
                Ok(report)
            }
            Err(e @ LedgerError::ChainCorruption { .. }) => {
                self.anchoring_halted.store(true, Ordering::Release);
                tracing::error!(error = %e, "anchoring halted pending operator action");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
