use sha2::{Digest, Sha256};

use crate::types::TranscriptSegment;

/// Stable fingerprint of a transcript's ordered segments.
///
/// Hashes the concatenation of `"{start}:{end}:{trimmed_text}"` lines in
/// segment order, so identical segment sequences always hash identically and
/// any change to timing or text changes the digest. Empty-after-trim segments
/// are skipped. Used only as a cache-validity key, never as a security
/// primitive.
pub fn transcript_hash(segments: &[TranscriptSegment]) -> String {
    let mut lines = Vec::with_capacity(segments.len());
    for seg in segments {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        lines.push(format!("{}:{}:{}", seg.start, seg.end, text));
    }
    let payload = lines.join("\n");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    #[test]
    fn identical_sequences_hash_identically() {
        let a = vec![seg(0.0, 2.0, "Hi"), seg(2.0, 5.0, "I love Maybelline")];
        let b = vec![seg(0.0, 2.0, "Hi"), seg(2.0, 5.0, "I love Maybelline")];
        assert_eq!(transcript_hash(&a), transcript_hash(&b));
    }

    #[test]
    fn text_change_changes_hash() {
        let a = vec![seg(0.0, 2.0, "Hi")];
        let b = vec![seg(0.0, 2.0, "Hello")];
        assert_ne!(transcript_hash(&a), transcript_hash(&b));
    }

    #[test]
    fn timing_change_changes_hash() {
        let a = vec![seg(0.0, 2.0, "Hi")];
        let b = vec![seg(0.0, 2.5, "Hi")];
        assert_ne!(transcript_hash(&a), transcript_hash(&b));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let a = vec![seg(0.0, 2.0, "Hi")];
        let b = vec![seg(0.0, 2.0, "  Hi \n")];
        assert_eq!(transcript_hash(&a), transcript_hash(&b));
    }

    #[test]
    fn empty_text_segments_are_dropped() {
        let a = vec![seg(0.0, 2.0, "Hi")];
        let b = vec![seg(0.0, 1.0, "   "), seg(0.0, 2.0, "Hi")];
        assert_eq!(transcript_hash(&a), transcript_hash(&b));
    }
}
