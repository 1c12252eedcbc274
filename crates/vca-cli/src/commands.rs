//! # Subcommand Handlers
//!
//! Each handler opens a [`Session`], calls one lifecycle operation,
//! persists if it mutated state, and prints JSON to stdout. Handlers
//! return the process exit code.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde::Serialize;

use vca_core::CredentialId;
use vca_ledger::ChainReport;
use vca_lifecycle::{
    AuditChainReport, CredentialLifecycle, CredentialView, Disclosure, IssueRequest,
    LifecycleError,
};
use vca_vc::CredentialType;

use crate::config::Config;
use crate::session::{self, Session};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the issuer DID and public key derived from the seed.
    Identity,

    /// Sign and store a new credential.
    Issue(IssueArgs),

    /// Anchor a credential's hash in the ledger.
    Anchor {
        /// Credential id.
        id: CredentialId,
    },

    /// Revoke a credential. Irreversible.
    Revoke {
        /// Credential id.
        id: CredentialId,
        /// Reason recorded in the audit log.
        #[arg(long)]
        reason: String,
    },

    /// Look a credential up by its SHA-256 hash. Exits 2 when unknown.
    Verify {
        /// Hex-encoded credential hash.
        hash: String,
    },

    /// Record the inspecting party's approval.
    Approve {
        /// Credential id.
        id: CredentialId,
    },

    /// Record the subject's acceptance.
    Accept {
        /// Credential id.
        id: CredentialId,
    },

    /// Show a credential through the disclosure gate, or list every
    /// disclosable credential.
    Show {
        /// Credential id; omit to list.
        id: Option<CredentialId>,
    },

    /// Verify ledger and audit log integrity. Exits 1 on failure.
    CheckChain,
}

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// bachelor, master, certificate or diploma.
    #[arg(long = "type", value_name = "TYPE")]
    pub credential_type: CredentialType,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub institution: String,
    /// Date conferred.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: NaiveDate,
    /// Student id or username.
    #[arg(long)]
    pub student: Option<String>,
    /// Subject name when the student is not in the directory.
    #[arg(long)]
    pub name: Option<String>,
}

impl From<&IssueArgs> for IssueRequest {
    fn from(args: &IssueArgs) -> Self {
        IssueRequest {
            credential_type: args.credential_type,
            title: args.title.clone(),
            institution: args.institution.clone(),
            date_issued: args.date,
            student_ref: args.student.clone(),
            subject_name: args.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityOutput {
    pub did: String,
    pub key_id: String,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainCheckOutput {
    pub ledger: Result<ChainReport, String>,
    pub audit: AuditChainReport,
}

impl ChainCheckOutput {
    pub fn is_valid(&self) -> bool {
        self.ledger.is_ok() && self.audit.chain_valid
    }
}

/// Dispatch `command`.
pub fn run(command: &Command, config: &Config) -> Result<u8> {
    match command {
        Command::Identity => {
            let identity = session::identity(config)?;
            print_json(&IdentityOutput {
                did: identity.did().to_string(),
                key_id: identity.key_id(),
                public_key: identity.public_key().to_hex(),
            })?;
            Ok(0)
        }
        Command::Issue(args) => mutate(config, |lc| {
            Ok(CredentialView::from(&lc.issue(args.into())?))
        }),
        Command::Anchor { id } => mutate(config, |lc| Ok(CredentialView::from(&lc.anchor(id)?))),
        Command::Revoke { id, reason } => {
            mutate(config, |lc| Ok(CredentialView::from(&lc.revoke(id, reason)?)))
        }
        Command::Approve { id } => {
            mutate(config, |lc| Ok(CredentialView::from(&lc.approve_visibility(id)?)))
        }
        Command::Accept { id } => {
            mutate(config, |lc| Ok(CredentialView::from(&lc.accept_visibility(id)?)))
        }
        Command::Verify { hash } => {
            let session = Session::open(config)?;
            let result = session.lifecycle().verify(hash)?;
            print_json(&result)?;
            Ok(if result.exists { 0 } else { 2 })
        }
        Command::Show { id } => {
            let session = Session::open(config)?;
            match id {
                Some(id) => print_json(&show(session.lifecycle(), id)?)?,
                None => print_json(&session.lifecycle().disclosable()?)?,
            }
            Ok(0)
        }
        Command::CheckChain => {
            let session = Session::open(config)?;
            let output = check_chain(session.lifecycle());
            print_json(&output)?;
            Ok(if output.is_valid() { 0 } else { 1 })
        }
    }
}

/// Run a mutating operation, persist, and print the resulting view.
fn mutate(
    config: &Config,
    op: impl FnOnce(&CredentialLifecycle) -> Result<CredentialView, LifecycleError>,
) -> Result<u8> {
    let session = Session::open(config)?;
    let view = op(session.lifecycle())?;
    session.persist()?;
    print_json(&view)?;
    Ok(0)
}

pub fn show(lifecycle: &CredentialLifecycle, id: &CredentialId) -> Result<Disclosure> {
    Ok(lifecycle.disclose(id)?)
}

pub fn check_chain(lifecycle: &CredentialLifecycle) -> ChainCheckOutput {
    ChainCheckOutput {
        ledger: lifecycle.verify_ledger().map_err(|e| e.to_string()),
        audit: lifecycle.verify_audit_chain(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
