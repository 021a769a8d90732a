use rand::{CryptoRng, Rng};

/// Length of session tokens handed out on login
pub const TOKEN_LENGTH: usize = 48;

const ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// Generate a random lowercase hex token of `length` characters.
///
/// Uses the thread-local CSPRNG, which is seeded and periodically
/// reseeded from the operating system.
pub fn generate(length: usize) -> String {
    generate_with(&mut rand::rng(), length)
}

/// Generate a token from the given cryptographically secure RNG
pub fn generate_with<R: Rng + CryptoRng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
