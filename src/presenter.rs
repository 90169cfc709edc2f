//! Rendering of race results for the terminal.
//!
//! Every race ends in exactly one of three user-visible messages: the
//! winning address with its source, a timeout notice, or an aggregate
//! failure listing each provider's error.

use cepfast_race::{ProviderFailure, RaceResult, Winner};
use serde_json::{Value, json};

use crate::config::OutputFormat;
use crate::error::{AppError, Result};

/// Render a race result in the requested format.
///
/// # Errors
///
/// Returns [`AppError::Render`] if JSON encoding fails.
pub fn render(result: &RaceResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => render_json(result),
    }
}

/// Human-readable rendering: a header line followed by `key: value` lines.
pub fn render_text(result: &RaceResult) -> String {
    match result {
        RaceResult::Success(winner) => render_winner(winner),
        RaceResult::Timeout { timeout, .. } => format!(
            "Timeout: no provider responded within {} ms",
            timeout.as_millis()
        ),
        RaceResult::AllFailed { failures } => format!(
            "All providers failed: {}",
            cepfast_race::types::join_failures(failures)
        ),
    }
}

fn render_winner(winner: &Winner) -> String {
    let header = format!(
        "Fastest response from: {} ({} ms)",
        winner.source,
        winner.elapsed.as_millis()
    );
    std::iter::once(header)
        .chain(winner.fields.iter().map(|(key, value)| format!("{key}: {value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON rendering with a `status` discriminator.
///
/// # Errors
///
/// Returns [`AppError::Render`] if the document cannot be encoded.
pub fn render_json(result: &RaceResult) -> Result<String> {
    let doc = match result {
        RaceResult::Success(winner) => json!({
            "status": "success",
            "source": winner.source,
            "elapsed_ms": duration_ms(winner.elapsed),
            "address": winner.fields,
        }),
        RaceResult::Timeout { timeout, failures } => json!({
            "status": "timeout",
            "timeout_ms": duration_ms(*timeout),
            "failures": failures_json(failures),
        }),
        RaceResult::AllFailed { failures } => json!({
            "status": "all_failed",
            "failures": failures_json(failures),
        }),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| AppError::Render(e.to_string()))
}

fn failures_json(failures: &[ProviderFailure]) -> Value {
    failures
        .iter()
        .map(|f| {
            json!({
                "source": f.source,
                "kind": f.error.kind(),
                "error": f.error.to_string(),
                "elapsed_ms": duration_ms(f.elapsed),
            })
        })
        .collect()
}

fn duration_ms(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
