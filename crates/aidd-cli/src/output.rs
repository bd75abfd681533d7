// crates/aidd-cli/src/output.rs
// ============================================================================
// Module: Structured Output
// Description: The `--format` value enum and the JSON/YAML rendering
//   helper every subcommand's structured result is printed through.
// Purpose: Give every subcommand one shared, tested way to turn a
//   serializable result into the text written to stdout.
// Dependencies: clap, serde, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! Every subcommand that prints a machine-readable result builds a
//! `serde`-serializable value and passes it through [`render`], rather than
//! hand-formatting JSON or YAML inline. JSON is rendered pretty-printed,
//! matching the canonical artifact formatting used elsewhere in this
//! workspace (`StageResult`, `ActiveState`, ...).

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

/// The output encoding a subcommand renders its structured result as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Failure rendering a value as structured output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The value could not be serialized to JSON.
    #[error("failed to render JSON output: {0}")]
    Json(#[from] serde_json::Error),
    /// The value could not be serialized to YAML.
    #[error("failed to render YAML output: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Renders `value` in `format`, returning the text to write to stdout.
///
/// # Errors
///
/// Returns [`OutputError`] when `value` cannot be serialized in the
/// requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
    }
}

#[cfg(test)]
mod tests {
    use super::OutputFormat;
    use super::render;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        count: u32,
    }

    #[test]
    fn renders_json_pretty_printed() {
        let sample = Sample { name: "aidd", count: 2 };
        let text = render(&sample, OutputFormat::Json).expect("renders");
        assert!(text.contains("\"name\": \"aidd\""));
    }

    #[test]
    fn renders_yaml() {
        let sample = Sample { name: "aidd", count: 2 };
        let text = render(&sample, OutputFormat::Yaml).expect("renders");
        assert!(text.contains("name: aidd"));
    }
}
