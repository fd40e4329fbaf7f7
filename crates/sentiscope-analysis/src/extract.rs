//! Locating the structured payload inside analyzer stdout.
//!
//! The analyzer prints progress text on the same stream as its result, so the
//! payload has to be carved out of surrounding noise. Two framings are
//! understood:
//!
//! - **Marker line**: a line starting with a configured prefix, followed by the
//!   JSON object. Unambiguous, and preferred whenever a marker is configured.
//! - **Outermost braces**: the span from the first `{` to the last `}`. Works
//!   with analyzers that cannot be changed, but breaks if the stream holds more
//!   than one JSON-like object or stray braces in log lines.

use serde_json::{Map, Value};

use crate::error::ExtractError;

/// Parse the text between the first `{` and the last `}` as a JSON object.
///
/// # Errors
///
/// [`ExtractError::NoPayload`] if either delimiter is missing or they are out of
/// order, [`ExtractError::InvalidJson`] if the span is not a JSON object. No
/// partial recovery is attempted.
pub fn extract(stdout: &str) -> Result<Map<String, Value>, ExtractError> {
    match (stdout.find('{'), stdout.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            Ok(serde_json::from_str(&stdout[start..=end])?)
        }
        _ => Err(ExtractError::NoPayload),
    }
}

/// Prefer the last line beginning with `marker`; otherwise fall back to [`extract`].
///
/// A marker line that does not parse is an error rather than a reason to fall back.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_framed(
    stdout: &str,
    marker: Option<&str>,
) -> Result<Map<String, Value>, ExtractError> {
    if let Some(marker) = marker {
        if let Some(line) = stdout.lines().rev().find_map(|l| l.strip_prefix(marker)) {
            return Ok(serde_json::from_str(line.trim())?);
        }
        tracing::debug!(marker, "no marked payload line; falling back to brace scan");
    }
    extract(stdout)
}
