//! Save payload handling: JSON snapshots plus portable export codes.
//!
//! Loading is deliberately forgiving: missing fields default, unknown fields
//! are ignored, and derived fields are recomputed. The one hard requirement
//! is a numeric `strokes` field; anything else is not a save of this game
//! and is rejected rather than guessed at.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::state::GameState;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save payload is missing a numeric strokes field")]
    InvalidPayload,
    #[error("save payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export code is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("export code is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize a state snapshot to its JSON save form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn save_string(state: &GameState) -> Result<String, SaveError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a save payload, tolerating missing and unknown fields, and
/// rehydrate derived state against the catalog.
///
/// # Errors
///
/// Returns [`SaveError::InvalidPayload`] when the payload lacks a numeric
/// `strokes` field, or a JSON error when the payload is not JSON at all.
pub fn load_from_str(catalog: &Catalog, payload: &str) -> Result<GameState, SaveError> {
    let value: Value = serde_json::from_str(payload)?;
    if value.get("strokes").and_then(Value::as_f64).is_none() {
        return Err(SaveError::InvalidPayload);
    }
    let state: GameState = serde_json::from_value(value)?;
    Ok(state.rehydrate(catalog))
}

/// Produce a portable, reversible export code for manual backup/transfer.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_code(state: &GameState) -> Result<String, SaveError> {
    Ok(URL_SAFE_NO_PAD.encode(save_string(state)?))
}

/// Decode and validate an export code produced by [`export_code`].
///
/// # Errors
///
/// Returns an error when the code is not base64, not UTF-8, or fails the
/// same shape validation as [`load_from_str`].
pub fn import_code(catalog: &Catalog, code: &str) -> Result<GameState, SaveError> {
    let bytes = URL_SAFE_NO_PAD.decode(code.trim())?;
    let payload = String::from_utf8(bytes)?;
    load_from_str(catalog, &payload)
}
