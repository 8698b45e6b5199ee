//! Room-code generation: short, human-shareable, unambiguous.

use rand::Rng;

/// 32 symbols with look-alikes (I, O, 0, 1) removed.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LEN: usize = 6;

/// Roll a random 6-character room code. Uniqueness is the caller's
/// concern; the directory re-rolls on collision.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are case-insensitive on the wire; uppercase is canonical.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
