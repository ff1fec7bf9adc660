//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep process ids and stack fingerprints from being
//! confused with plain integers and strings in function signatures.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Process ID
///
/// Represents the target process being sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl Serialize for Pid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.0)
    }
}

/// Number of digest bytes kept in a [`StackSignature`].
pub const SIGNATURE_LEN: usize = 8;

/// Fixed-size fingerprint of a thread's ordered stack frames.
///
/// Two threads (or one thread across two samples) with the same frame text in
/// the same order always produce the same signature. The digest is the
/// truncated SHA-256 of the frames joined by `\n`, so an empty stack has a
/// well-defined signature too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackSignature([u8; SIGNATURE_LEN]);

impl StackSignature {
    /// Compute the signature of an ordered frame sequence (innermost first).
    #[must_use]
    pub fn from_frames<S: AsRef<str>>(frames: &[S]) -> Self {
        let mut hasher = Sha256::new();
        for (idx, frame) in frames.iter().enumerate() {
            if idx > 0 {
                hasher.update(b"\n");
            }
            hasher.update(frame.as_ref().as_bytes());
        }
        let digest = hasher.finalize();

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes.copy_from_slice(&digest[..SIGNATURE_LEN]);
        Self(bytes)
    }
}

impl fmt::Display for StackSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for StackSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = StackSignature::from_frames(&["acquire (threading.py:10)", "run (app.py:3)"]);
        let b = StackSignature::from_frames(&["acquire (threading.py:10)", "run (app.py:3)"]);
        assert_eq!(a, b);
        assert_eq!(a.to_string().len(), SIGNATURE_LEN * 2);
    }

    #[test]
    fn test_signature_depends_on_frame_order() {
        let a = StackSignature::from_frames(&["a (x.py:1)", "b (x.py:2)"]);
        let b = StackSignature::from_frames(&["b (x.py:2)", "a (x.py:1)"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_hashes_newline_joined_text() {
        let joined = StackSignature::from_frames(&["a\nb"]);
        let split = StackSignature::from_frames(&["a", "b"]);
        assert_eq!(joined, split);
        assert_ne!(StackSignature::from_frames(&["ab"]), split);
    }

    #[test]
    fn test_empty_stack_signature() {
        let empty: [&str; 0] = [];
        assert_eq!(StackSignature::from_frames(&empty), StackSignature::from_frames(&empty));
    }
}
