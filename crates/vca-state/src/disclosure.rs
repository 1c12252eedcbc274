//! # Dual-Consent Disclosure
//!
//! Read-path gate deciding whether a record may be shown to a third party.
//! Checked in order: revoked, awaiting the inspecting party's approval,
//! awaiting the subject's acceptance.

use serde::{Deserialize, Serialize};

use vca_core::{ContentDigest, CredentialId, StudentId};

use crate::record::CredentialRecord;
use crate::status::CredentialStatus;

/// Why a record is withheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    Revoked,
    AwaitingRecruiterApproval,
    AwaitingStudentAcceptance,
}

impl std::fmt::Display for HiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Revoked => "credential has been revoked",
            Self::AwaitingRecruiterApproval => "awaiting recruiter approval",
            Self::AwaitingStudentAcceptance => "awaiting student acceptance",
        })
    }
}

/// Outcome of a disclosure request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "disclosure", content = "value", rename_all = "lowercase")]
pub enum Disclosure {
    Visible(CredentialView),
    Hidden(HiddenReason),
}

impl Disclosure {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible(_))
    }
}

impl CredentialRecord {
    /// `Ok(())` iff both consent flags are set and the record is not
    /// revoked.
    pub fn disclosure_gate(&self) -> Result<(), HiddenReason> {
        if self.is_revoked() {
            return Err(HiddenReason::Revoked);
        }
        if !self.recruiter_approved {
            return Err(HiddenReason::AwaitingRecruiterApproval);
        }
        if !self.student_accepted {
            return Err(HiddenReason::AwaitingStudentAcceptance);
        }
        Ok(())
    }

    pub fn is_disclosable(&self) -> bool {
        self.disclosure_gate().is_ok()
    }

    /// Apply the gate and render the external view.
    pub fn disclose(&self) -> Disclosure {
        match self.disclosure_gate() {
            Ok(()) => Disclosure::Visible(CredentialView::from(self)),
            Err(reason) => Disclosure::Hidden(reason),
        }
    }
}

/// The externally observable record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    pub id: CredentialId,
    pub title: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub institution: String,
    /// `YYYY-MM-DD`.
    pub date_issued: String,
    pub status: CredentialStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub student_id: Option<StudentId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vc_hash: Option<ContentDigest>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor_block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anchor_block_hash: Option<ContentDigest>,
    pub recruiter_approved: bool,
    pub student_accepted: bool,
}

impl From<&CredentialRecord> for CredentialView {
    fn from(r: &CredentialRecord) -> Self {
        Self {
            id: r.id,
            title: r.title.clone(),
            credential_type: r.credential_type.as_str().to_string(),
            institution: r.institution.clone(),
            date_issued: r.date_issued.format("%Y-%m-%d").to_string(),
            status: r.status,
            student_id: r.student_id.clone(),
            vc_hash: r.vc_hash,
            anchor_block_height: r.anchor.map(|a| a.block_height),
            anchor_block_hash: r.anchor.map(|a| a.block_hash),
            recruiter_approved: r.recruiter_approved,
            student_accepted: r.student_accepted,
        }
    }
}
