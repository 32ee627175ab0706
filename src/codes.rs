//! Room Codes
//!
//! Short join codes for rooms. The alphabet drops I and O so a code read
//! aloud across a table survives the trip.

use rand::Rng;

/// Characters a generated room code may contain.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of a generated room code.
pub const ROOM_CODE_LEN: usize = 4;

/// Generate a fresh room code.
pub fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize a user-entered room code: trimmed and uppercased. Any
/// non-empty string is a usable channel key; only emptiness is rejected.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_use_the_alphabet() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LEN);
            assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_letters() {
        assert_eq!(ROOM_CODE_ALPHABET.len(), 24);
        assert!(!ROOM_CODE_ALPHABET.contains(&b'I'));
        assert!(!ROOM_CODE_ALPHABET.contains(&b'O'));
    }

    #[test]
    fn test_normalize_uppercases_and_trims() {
        assert_eq!(normalize_room_code(" abcd "), Some("ABCD".to_string()));
        assert_eq!(normalize_room_code("WXYZ"), Some("WXYZ".to_string()));
        assert_eq!(normalize_room_code("   "), None);
        assert_eq!(normalize_room_code(""), None);
    }
}
