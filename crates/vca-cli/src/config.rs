//! # Configuration
//!
//! Loaded once at start-up, lowest precedence first:
//!
//! 1. Defaults.
//! 2. Optional YAML file (`--config` / `VCA_CONFIG`).
//! 3. Environment: `VCA_SEED`, `VCA_DIFFICULTY`, `VCA_MAX_ATTEMPTS`,
//!    `VCA_MINING_TIMEOUT_MS`, `VCA_STATE_FILE`, `VCA_REANCHOR`,
//!    `VCA_ANCHOR_CHECK`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use vca_ledger::Difficulty;
use vca_lifecycle::{AnchorCheck, LifecycleConfig, ReanchorPolicy, StudentIdentity};

pub const DEFAULT_STATE_FILE: &str = "vca-state.json";

/// The YAML file layer. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub seed: Option<String>,
    pub state_file: Option<PathBuf>,
    pub difficulty: Option<u32>,
    pub max_attempts: Option<u64>,
    pub mining_timeout_ms: Option<u64>,
    pub max_append_retries: Option<u32>,
    pub reanchor: Option<ReanchorPolicy>,
    pub anchor_check: Option<AnchorCheck>,
    /// Student directory used to resolve `--student`.
    pub students: Vec<StudentIdentity>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

/// Resolved configuration.
pub struct Config {
    seed: Option<String>,
    pub state_file: PathBuf,
    pub lifecycle: LifecycleConfig,
    pub students: Vec<StudentIdentity>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("seed", &self.seed.as_ref().map(|_| "<redacted>"))
            .field("state_file", &self.state_file)
            .field("lifecycle", &self.lifecycle)
            .field("students", &self.students.len())
            .finish()
    }
}

impl Config {
    /// Load from the optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => FileConfig::from_path(p)?,
            None => FileConfig::default(),
        };
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge `file` with variables looked up through `env`.
    pub fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut lifecycle = LifecycleConfig::default();

        let difficulty = parse_env(&env, "VCA_DIFFICULTY")?.or(file.difficulty);
        if let Some(zeros) = difficulty {
            lifecycle.ledger.difficulty =
                Difficulty::new(zeros).context("invalid ledger difficulty")?;
        }
        if let Some(cap) = parse_env(&env, "VCA_MAX_ATTEMPTS")?.or(file.max_attempts) {
            lifecycle.ledger.max_attempts = cap;
        }
        if let Some(ms) = parse_env(&env, "VCA_MINING_TIMEOUT_MS")?.or(file.mining_timeout_ms) {
            lifecycle.ledger.mining_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(retries) = file.max_append_retries {
            lifecycle.ledger.max_append_retries = retries;
        }
        if let Some(policy) = parse_env(&env, "VCA_REANCHOR")?.or(file.reanchor) {
            lifecycle.reanchor = policy;
        }
        if let Some(check) = parse_env(&env, "VCA_ANCHOR_CHECK")?.or(file.anchor_check) {
            lifecycle.anchor_check = check;
        }

        Ok(Self {
            seed: env("VCA_SEED").or(file.seed),
            state_file: env("VCA_STATE_FILE")
                .map(PathBuf::from)
                .or(file.state_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            lifecycle,
            students: file.students,
        })
    }

    /// The issuer seed.
    pub fn seed(&self) -> Result<&[u8]> {
        self.seed
            .as_deref()
            .map(str::as_bytes)
            .context("no issuer seed configured (set VCA_SEED or `seed` in the config file)")
    }
}

fn parse_env<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
    }
}
