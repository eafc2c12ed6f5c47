//! Content fingerprinting and change detection.
//!
//! The fingerprint is a SHA-256 digest of a document's extracted text,
//! compared against checksums read back from the store to decide whether a
//! file can be skipped. It is never used as a storage key; record ids stay
//! path + index based.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Hex SHA-256 of the UTF-8 bytes of `text`.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    Skip,
    Reprocess,
}

/// Skip only when refresh mode supplied a previous checksum for this path
/// and it equals the new one; in every other case the file is reprocessed.
/// `previous` is `None` when refresh mode is off.
pub fn decide(
    relative_path: &str,
    new_checksum: &str,
    previous: Option<&HashMap<String, String>>,
) -> ChangeDecision {
    match previous.and_then(|map| map.get(relative_path)) {
        Some(prev) if prev == new_checksum => ChangeDecision::Skip,
        _ => ChangeDecision::Reprocess,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint("hello"), fingerprint("hello"));
        assert_eq!(fingerprint("hello").len(), 64);
    }

    #[test]
    fn one_byte_change_alters_checksum() {
        assert_ne!(fingerprint("hello"), fingerprint("hellp"));
    }

    #[test]
    fn without_refresh_everything_reprocesses() {
        assert_eq!(
            decide("a.md", &fingerprint("x"), None),
            ChangeDecision::Reprocess
        );
    }

    #[test]
    fn matching_previous_checksum_skips() {
        let sum = fingerprint("stable content");
        let mut previous = HashMap::new();
        previous.insert("a.md".to_string(), sum.clone());

        assert_eq!(decide("a.md", &sum, Some(&previous)), ChangeDecision::Skip);
        assert_eq!(
            decide("a.md", &fingerprint("changed"), Some(&previous)),
            ChangeDecision::Reprocess
        );
        assert_eq!(
            decide("other.md", &sum, Some(&previous)),
            ChangeDecision::Reprocess
        );
    }
}
