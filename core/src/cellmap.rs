//! Cell-map normalization for raw model output.
//!
//! Models asked for "just valid JSON" still wrap their replies in markdown
//! code fences often enough that the gateway strips a leading/trailing fence
//! before parsing. Fences appearing mid-string are left alone.

use serde_json::Value;
use tracing::warn;

use crate::{GridmindError, Result};

/// Mapping from coordinate labels ("c{col}r{row}", 1-indexed) to cell values.
///
/// Keys are not validated; a malformed label passes through to the caller
/// untouched.
pub type CellMap = serde_json::Map<String, Value>;

/// Parses raw model output into a [`CellMap`].
///
/// Strips an optional code-fence wrapper, then requires the remainder to be a
/// non-empty JSON object. The parsed object is returned exactly as-is, with
/// no key or value transformation.
pub fn normalize(raw: &str) -> Result<CellMap> {
    let content = strip_code_fences(raw);

    if content.is_empty() {
        return Err(GridmindError::EmptyCompletion);
    }

    let value: Value = serde_json::from_str(content).map_err(|e| {
        warn!(target: "cellmap", error = %e, content = %content, "Model output failed JSON parse");
        GridmindError::InvalidJson(e)
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(GridmindError::NotACellMap),
    }
}

// Order matters: the "```json" marker first, then a bare leading fence, then
// a trailing fence, re-trimming after each step.
fn strip_code_fences(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest.trim();
    }
    if let Some(rest) = content.strip_prefix("```") {
        content = rest.trim();
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest.trim();
    }
    content
}
