//! Constant-time comparisons
//!
//! Digest checks on webhook bodies go through these helpers so the
//! comparison time does not depend on where two values first differ.

use subtle::ConstantTimeEq;

/// Constant-time byte comparison. Length is not secret.
pub fn constant_time_bytes_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Constant-time string comparison (for digests, tokens, etc.)
pub fn constant_time_str_compare(a: &str, b: &str) -> bool {
    constant_time_bytes_compare(a.as_bytes(), b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_str_compare() {
        let digest1 = "n4bQgYhMfWWaL+qgxVrQFaO/TxsrC4Is0V1sFbDwCgg=";
        let digest2 = "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek=";
        let digest1_copy = "n4bQgYhMfWWaL+qgxVrQFaO/TxsrC4Is0V1sFbDwCgg=";

        assert!(constant_time_str_compare(digest1, digest1_copy));
        assert!(!constant_time_str_compare(digest1, digest2));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!constant_time_bytes_compare(b"abc", b"abcd"));
        assert!(constant_time_bytes_compare(b"", b""));
    }
}
