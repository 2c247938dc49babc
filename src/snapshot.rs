//! Persistence boundary: the canonical state to and from opaque bytes.
//!
//! Only the encoding lives here. Where the bytes are stored is the caller's
//! business.

use bincode::config;

use crate::error::GameError;
use crate::state::GameState;

pub fn save(state: &GameState) -> Result<Vec<u8>, GameError> {
    bincode::serde::encode_to_vec(state, config::standard())
        .map_err(|err| GameError::Snapshot(err.to_string()))
}

/// Decodes a saved game. Empty input means there is nothing to resume.
/// Decoded states are audited before being handed out.
pub fn load(bytes: &[u8]) -> Result<Option<GameState>, GameError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let (state, read): (GameState, usize) =
        bincode::serde::decode_from_slice(bytes, config::standard())
            .map_err(|err| GameError::Snapshot(err.to_string()))?;
    if read != bytes.len() {
        return Err(GameError::Snapshot(format!(
            "{} trailing bytes",
            bytes.len() - read
        )));
    }
    state.audit()?;
    Ok(Some(state))
}
