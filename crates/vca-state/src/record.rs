//! # Credential Records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use vca_core::{ContentDigest, CredentialId, StudentId, Timestamp};
use vca_vc::CredentialType;

use crate::error::CredentialError;
use crate::status::{CredentialStatus, StatusTransition};

/// Where a credential hash was anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRef {
    pub block_height: u64,
    pub block_hash: ContentDigest,
}

/// Everything `issue` knows about a new credential.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub id: CredentialId,
    pub title: String,
    pub credential_type: CredentialType,
    pub institution: String,
    pub date_issued: NaiveDate,
    /// Resolved internal student, `None` for anonymous issuance.
    pub student_id: Option<StudentId>,
    /// `sub` claim of the token.
    pub subject_ref: String,
    pub subject_name: String,
    pub vc_token: String,
    pub vc_hash: ContentDigest,
}

/// A persisted credential. Never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: CredentialId,
    pub title: String,
    pub credential_type: CredentialType,
    pub institution: String,
    pub date_issued: NaiveDate,
    pub student_id: Option<StudentId>,
    pub subject_ref: String,
    pub subject_name: String,
    pub status: CredentialStatus,
    pub recruiter_approved: bool,
    pub student_accepted: bool,
    pub recruiter_approved_at: Option<Timestamp>,
    pub student_accepted_at: Option<Timestamp>,
    pub vc_token: String,
    pub vc_hash: Option<ContentDigest>,
    pub anchor: Option<AnchorRef>,
    pub created_at: Timestamp,
    /// Ordered status history.
    pub transitions: Vec<StatusTransition>,
}

impl CredentialRecord {
    /// A freshly issued record: `verified`, both flags false, unanchored.
    pub fn issued(new: NewCredential, at: Timestamp) -> Self {
        let mut record = Self {
            id: new.id,
            title: new.title,
            credential_type: new.credential_type,
            institution: new.institution,
            date_issued: new.date_issued,
            student_id: new.student_id,
            subject_ref: new.subject_ref,
            subject_name: new.subject_name,
            status: CredentialStatus::Pending,
            recruiter_approved: false,
            student_accepted: false,
            recruiter_approved_at: None,
            student_accepted_at: None,
            vc_token: new.vc_token,
            vc_hash: Some(new.vc_hash),
            anchor: None,
            created_at: at,
            transitions: Vec::new(),
        };
        record.do_transition(CredentialStatus::Verified, "issued", at);
        record
    }

    /// Move to `revoked`.
    ///
    /// Returns `false` if the record was already revoked, in which case
    /// nothing changes.
    pub fn revoke(&mut self, reason: &str, at: Timestamp) -> Result<bool, CredentialError> {
        if self.status == CredentialStatus::Revoked {
            return Ok(false);
        }
        self.transition(CredentialStatus::Revoked, reason, at)?;
        Ok(true)
    }

    /// Set the inspecting party's approval. One-way; returns whether the
    /// flag changed.
    pub fn approve_visibility(&mut self, at: Timestamp) -> bool {
        if self.recruiter_approved {
            return false;
        }
        self.recruiter_approved = true;
        self.recruiter_approved_at = Some(at);
        true
    }

    /// Set the subject's acceptance. One-way; returns whether the flag
    /// changed.
    pub fn accept_visibility(&mut self, at: Timestamp) -> bool {
        if self.student_accepted {
            return false;
        }
        self.student_accepted = true;
        self.student_accepted_at = Some(at);
        true
    }

    /// Attach `anchor` to the record.
    ///
    /// An unanchored record always takes it. An anchored one fails with
    /// `AlreadyAnchored` unless `replace_existing` is set, and then only
    /// moves to a higher block. Returns whether the anchor was stored.
    pub fn attach_anchor(
        &mut self,
        anchor: AnchorRef,
        replace_existing: bool,
    ) -> Result<bool, CredentialError> {
        match self.anchor {
            None => {}
            Some(existing) if !replace_existing => {
                return Err(CredentialError::AlreadyAnchored {
                    id: self.id,
                    block_height: existing.block_height,
                });
            }
            Some(existing) if existing.block_height >= anchor.block_height => return Ok(false),
            Some(_) => {}
        }
        self.anchor = Some(anchor);
        Ok(true)
    }

    pub fn is_revoked(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(
        &mut self,
        to: CredentialStatus,
        reason: &str,
        at: Timestamp,
    ) -> Result<(), CredentialError> {
        if !self.status.can_transition_to(to) {
            return Err(CredentialError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.do_transition(to, reason, at);
        Ok(())
    }

    fn do_transition(&mut self, to: CredentialStatus, reason: &str, at: Timestamp) {
        self.transitions.push(StatusTransition {
            from: self.status,
            to,
            at,
            reason: reason.to_string(),
        });
        self.status = to;
    }
}
