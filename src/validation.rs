//! Identifier validation for wire-supplied strings that become storage keys.
//!
//! Owner ids are spliced into sled key prefixes (`items:{owner}:{id}`,
//! `inv:{owner}:{item}`), so the key separator and control characters must
//! never appear in them; an embedded `:` would make one owner's records show
//! up inside another owner's prefix scans.

use thiserror::Error;

/// Maximum accepted owner id length.
pub const MAX_ID_LENGTH: usize = 64;

/// The key separator used by the store. Never valid inside a key segment.
pub const KEY_SEPARATOR: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("id is empty")]
    Empty,

    #[error("id is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// True when `s` can be embedded in a store key without colliding with the
/// key scheme: nonempty, length-capped, no separator, no control characters,
/// no whitespace.
pub fn is_safe_key_segment(s: &str) -> bool {
    validate_key_segment(s).is_ok()
}

pub fn validate_key_segment(s: &str) -> Result<(), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if s.chars().count() > MAX_ID_LENGTH {
        return Err(IdError::TooLong { max: MAX_ID_LENGTH });
    }
    for ch in s.chars() {
        if ch == KEY_SEPARATOR || ch.is_control() || ch.is_whitespace() {
            return Err(IdError::InvalidCharacter(ch));
        }
    }
    Ok(())
}

/// Validate an owner id arriving off the wire (`JOIN` / `VISIT`), before it
/// reaches the registry or the store.
pub fn validate_owner_id(owner_id: &str) -> Result<(), IdError> {
    validate_key_segment(owner_id)
}
