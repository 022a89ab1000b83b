//! Prompt helpers: fingerprints and budget truncation.

use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a prompt string.
///
/// Logged at startup so a deployed classifier prompt can be matched to its
/// source without printing it.
pub fn hash_prompt(prompt: &str) -> String {
    Sha256::digest(prompt.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Keep at most the last `max_chars` characters of `text`.
///
/// Cuts on a char boundary; returns the input unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let skip = total - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_prompt_stable() {
        let first = hash_prompt("route this");
        assert_eq!(first, hash_prompt("route this"));
        assert_ne!(first, hash_prompt("route that"));
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate_chars("abcdef", 3), "def");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 5), "wörld");
    }
}
