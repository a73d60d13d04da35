//! Room join-code generation and validation.

use rand::Rng;
use relaygate_core::constants::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH};

/// Generates a fresh room join code.
///
/// Five characters drawn uniformly from `A..=Z`. Uniqueness is not checked
/// here; a collision with an existing room surfaces as a room-create
/// failure from the relay, which owns the namespace.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(ROOM_CODE_LENGTH);
    for _ in 0..ROOM_CODE_LENGTH {
        let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
        code.push(ROOM_CODE_ALPHABET[index] as char);
    }
    code
}

/// Returns true if the given string has the shape of a room join code.
///
/// Diagnostic only: a malformed code is still forwarded to the relay, which
/// is the authority on whether a join succeeds.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
}
