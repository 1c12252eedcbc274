//! # Session
//!
//! Opens the lifecycle for one invocation: derive the issuer identity,
//! restore the state file if present, and write it back after mutations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use vca_crypto::{derive_identity, IssuerIdentity};
use vca_lifecycle::{CredentialLifecycle, InMemoryDirectory, LifecycleSnapshot};

use crate::config::Config;

pub struct Session {
    lifecycle: CredentialLifecycle,
    state_file: PathBuf,
}

impl Session {
    /// Open the lifecycle described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let identity = identity(config)?;
        let lifecycle = if config.state_file.exists() {
            let snapshot = LifecycleSnapshot::load(&config.state_file)?;
            CredentialLifecycle::restore(identity, snapshot, config.lifecycle.clone())
                .with_context(|| {
                    format!("failed to restore state from {}", config.state_file.display())
                })?
        } else {
            tracing::info!(
                state_file = %config.state_file.display(),
                "no state file; starting an empty ledger"
            );
            CredentialLifecycle::new(identity, config.lifecycle.clone())
        };
        let directory = InMemoryDirectory::with_students(config.students.iter().cloned());
        Ok(Self {
            lifecycle: lifecycle.with_resolver(Arc::new(directory)),
            state_file: config.state_file.clone(),
        })
    }

    pub fn lifecycle(&self) -> &CredentialLifecycle {
        &self.lifecycle
    }

    /// Write the current state back to the state file.
    pub fn persist(&self) -> Result<()> {
        self.lifecycle
            .snapshot()?
            .save(&self.state_file)
            .with_context(|| format!("failed to save state to {}", self.state_file.display()))
    }
}

/// Derive the issuer identity from the configured seed.
pub fn identity(config: &Config) -> Result<IssuerIdentity> {
    derive_identity(config.seed()?).context("failed to derive issuer identity from seed")
}
