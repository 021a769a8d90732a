/// Compare two secrets in constant time with respect to their contents.
///
/// Used for password digests so that a mismatch position cannot be
/// recovered from response timing. Length differences return early.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .as_bytes()
            .iter()
            .zip(expected.as_bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
