use rand::rngs::OsRng;
use rand::Rng;
use sha2::Digest;
use sha2::Sha256;

/// Number of characters in a token plaintext.
pub const TOKEN_LENGTH: usize = 26;

/// Number of bytes in a token digest.
pub const TOKEN_HASH_LENGTH: usize = 32;

// RFC 4648 base32 alphabet, 5 bits per character.
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generate a new opaque token plaintext.
///
/// Draws 26 base32 characters (130 bits) from the operating system RNG.
/// The plaintext is meant to be shown to its owner once and never stored.
///
/// # Returns
/// Random token plaintext
pub fn generate_token() -> String {
    let mut rng = OsRng;
    (0..TOKEN_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Hash a token plaintext for storage and lookup.
///
/// SHA-256 is sufficient here: the input already carries 130 bits of
/// entropy, so there is nothing for an adaptive hash to protect.
///
/// # Arguments
/// * `plaintext` - Token plaintext as presented by the caller
///
/// # Returns
/// 32-byte digest
pub fn hash_token(plaintext: &str) -> [u8; TOKEN_HASH_LENGTH] {
    Sha256::digest(plaintext.as_bytes()).into()
}

/// Check whether a string has the shape of a token plaintext.
///
/// # Arguments
/// * `plaintext` - Candidate token
///
/// # Returns
/// True if the candidate has the right length and alphabet
pub fn is_well_formed(plaintext: &str) -> bool {
    plaintext.len() == TOKEN_LENGTH && plaintext.bytes().all(|b| ALPHABET.contains(&b))
}
