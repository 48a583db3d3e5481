// THEORY:
// The `response_parser` module is the tolerant boundary between the inference
// collaborator's free-text output and the typed records the rest of the
// engine works with. Collaborator responses should contain a JSON array of
// detection-like objects, but in practice arrive wrapped in commentary,
// markdown code fences, or both.
//
// Key architectural principles:
// 1.  **Total Function**: This boundary never fails. Any response that does
//     not yield a parseable array produces an empty sequence, logged at warn
//     level. A garbled response costs one tile's detections, nothing more.
// 2.  **Balanced Scan, Not Regex**: The first `[` in the text opens a
//     candidate; the scan tracks string literals and escapes so brackets
//     inside quoted values cannot terminate it early, and ends at the
//     matching close bracket of the top-level array.
// 3.  **Per-Element Tolerance**: The candidate array is parsed element by
//     element. One malformed entry (missing confidence, degenerate box) is
//     skipped with a warning instead of discarding its well-formed siblings.

use crate::core_modules::detection::Detection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Extracts the first balanced top-level JSON array from `text` and parses
/// its elements into `T`, skipping elements that do not fit the record shape.
/// Returns an empty vector when no parseable array is present.
pub fn parse_array<T: DeserializeOwned>(text: &str) -> Vec<T> {
    let Some(candidate) = first_balanced_array(text) else {
        warn!("response text contained no JSON array; treating as empty");
        return Vec::new();
    };

    let elements: Vec<Value> = match serde_json::from_str(candidate) {
        Ok(elements) => elements,
        Err(error) => {
            warn!(%error, "candidate array failed to parse; treating as empty");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(elements.len());
    for element in elements {
        match serde_json::from_value::<T>(element) {
            Ok(record) => records.push(record),
            Err(error) => warn!(%error, "skipping malformed array element"),
        }
    }
    records
}

/// Parses a detection response. On top of the generic array handling this
/// enforces the bbox invariant (ymin < ymax, xmin < xmax) once, here, so no
/// later stage has to re-validate geometry.
pub fn parse_detections(text: &str) -> Vec<Detection> {
    let mut detections: Vec<Detection> = parse_array(text);
    detections.retain(|detection| {
        if detection.bbox.is_valid() {
            true
        } else {
            warn!(tag = ?detection.tag, "skipping detection with degenerate bounding box");
            false
        }
    });
    detections
}

/// Finds the first balanced top-level array token, respecting JSON string
/// literals and escape sequences. Returns `None` when the text holds no
/// complete array.
fn first_balanced_array(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&byte| byte == b'[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && byte == b']' {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
