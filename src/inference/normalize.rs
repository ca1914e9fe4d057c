//! Symptom text normalization.

use super::InferenceError;

/// Split a raw comma-separated symptom string into canonical tokens.
///
/// Every comma-separated segment yields exactly one token, so `"a,,b"` gives
/// three tokens, the middle one empty. An empty token never matches the
/// vocabulary and is dropped by the encoder.
pub fn normalize_symptoms(raw: &str) -> Result<Vec<String>, InferenceError> {
    if raw.trim().is_empty() {
        return Err(InferenceError::EmptyInput);
    }
    Ok(raw.split(',').map(normalize_token).collect())
}

/// Canonical form of a single symptom: trimmed, lowercase, inner whitespace
/// runs collapsed to one underscore (`" Skin  Rash "` → `"skin_rash"`).
pub fn normalize_token(token: &str) -> String {
    token
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
