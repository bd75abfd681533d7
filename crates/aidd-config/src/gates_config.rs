// crates/aidd-config/src/gates_config.rs
// ============================================================================
// Module: Gate and Workflow Config Loading
// Description: Strict, fail-closed loaders for `config/gates.json`,
//   `config/context_gc.json`, and `config/conventions.json`.
// Purpose: Keep gate thresholds and workflow conventions out of compiled
//   code while still failing closed on malformed or oversized input.
// Dependencies: aidd-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every loader here enforces a byte-size ceiling before attempting to parse
//! the file, mirroring the teacher's `MAX_*` constant convention: a
//! malformed or maliciously large config file fails the load rather than
//! being parsed into a partially-sane struct.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Maximum accepted size, in bytes, for any single config file this crate
/// loads.
pub const MAX_CONFIG_FILE_BYTES: u64 = 262_144;

/// Minimum accepted question count for `analyst_check`/`research_check`.
const MIN_QUESTION_COUNT_FLOOR: u32 = 1;

/// Gate thresholds loaded from `config/gates.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatesConfig {
    /// Minimum number of answered questions `analyst_check` requires.
    pub min_question_count: u32,
    /// Maximum age, in days, research evidence may be before
    /// `research_check` considers it stale.
    pub research_freshness_days: u32,
    /// Maximum number of files a single implement pass may touch before
    /// `diff_boundary_check` blocks.
    pub max_diff_files: u32,
    /// Branch name globs exempt from preflight gates entirely.
    #[serde(default)]
    pub skip_branch_globs: Vec<String>,
}

impl GatesConfig {
    /// Validates the loaded config, failing closed on out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] when `min_question_count` is
    /// below [`MIN_QUESTION_COUNT_FLOOR`] or `max_diff_files` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_question_count < MIN_QUESTION_COUNT_FLOOR {
            return Err(ConfigError::OutOfRange("min_question_count must be at least 1".to_string()));
        }
        if self.max_diff_files == 0 {
            return Err(ConfigError::OutOfRange("max_diff_files must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Context garbage-collection thresholds loaded from
/// `config/context_gc.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextGcConfig {
    /// Approximate token budget a `UserPromptSubmit` hook warns above.
    pub warn_token_budget: u32,
    /// Approximate token budget a `UserPromptSubmit` hook blocks above.
    pub hard_token_budget: u32,
}

/// Naming/structure conventions loaded from `config/conventions.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionsConfig {
    /// Allowed ticket key prefixes, e.g. `["AIDD", "OPS"]`.
    pub ticket_prefixes: Vec<String>,
    /// Required tasklist section headings, in order.
    pub required_tasklist_sections: Vec<String>,
}

/// Reads `path`, enforcing [`MAX_CONFIG_FILE_BYTES`] before parsing.
fn read_bounded(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let metadata = fs::metadata(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge(path.to_path_buf(), metadata.len()));
    }
    fs::read(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))
}

/// Loads and validates `config/gates.json` under `config_dir`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is missing, oversized, malformed,
/// or fails [`GatesConfig::validate`].
pub fn load_gates_config(config_dir: &Path) -> Result<GatesConfig, ConfigError> {
    let path = config_dir.join("gates.json");
    let bytes = read_bounded(&path)?;
    let config: GatesConfig =
        serde_json::from_slice(&bytes).map_err(|err| ConfigError::Decode(path, err))?;
    config.validate()?;
    Ok(config)
}

/// Loads `config/context_gc.json` under `config_dir`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is missing, oversized, or
/// malformed.
pub fn load_context_gc_config(config_dir: &Path) -> Result<ContextGcConfig, ConfigError> {
    let path = config_dir.join("context_gc.json");
    let bytes = read_bounded(&path)?;
    serde_json::from_slice(&bytes).map_err(|err| ConfigError::Decode(path, err))
}

/// Loads `config/conventions.json` under `config_dir`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is missing, oversized, or
/// malformed.
pub fn load_conventions_config(config_dir: &Path) -> Result<ConventionsConfig, ConfigError> {
    let path = config_dir.join("conventions.json");
    let bytes = read_bounded(&path)?;
    serde_json::from_slice(&bytes).map_err(|err| ConfigError::Decode(path, err))
}

/// Failure loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O operation against `path` failed.
    #[error("config I/O error at {0}: {1}")]
    Io(PathBuf, #[source] io::Error),
    /// The file at `path` exceeds [`MAX_CONFIG_FILE_BYTES`].
    #[error("config file at {0} is too large ({1} bytes)")]
    TooLarge(PathBuf, u64),
    /// The file at `path` could not be decoded as JSON.
    #[error("config file at {0} is not valid JSON: {1}")]
    Decode(PathBuf, #[source] serde_json::Error),
    /// The decoded config failed validation.
    #[error("config validation failed: {0}")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::GatesConfig;
    use super::load_gates_config;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_a_well_formed_gates_config() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("gates.json"),
            r#"{"min_question_count":3,"research_freshness_days":14,"max_diff_files":40,"skip_branch_globs":["docs/**"]}"#,
        )
        .expect("writes");

        let config = load_gates_config(dir.path()).expect("loads");
        assert_eq!(config.min_question_count, 3);
        assert_eq!(config.skip_branch_globs, vec!["docs/**".to_string()]);
    }

    #[test]
    fn rejects_zero_max_diff_files() {
        let config = GatesConfig {
            min_question_count: 3,
            research_freshness_days: 14,
            max_diff_files: 0,
            skip_branch_globs: Vec::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_config_files() {
        let dir = tempdir().expect("tempdir");
        let oversized = "x".repeat(super::MAX_CONFIG_FILE_BYTES as usize + 1);
        fs::write(dir.path().join("gates.json"), oversized).expect("writes");

        assert!(load_gates_config(dir.path()).is_err());
    }

    #[test]
    fn rejects_missing_config_files() {
        let dir = tempdir().expect("tempdir");
        assert!(load_gates_config(dir.path()).is_err());
    }
}
