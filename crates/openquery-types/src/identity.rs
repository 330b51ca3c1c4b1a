//! Identity types for OpenQuery
//!
//! Actor identities are strongly typed wrappers around UUIDs so that asker,
//! responder, and fee-receiver ids cannot be mixed up with entity ids.
//! Question and answer ids are content-derived SHA-256 digests with
//! domain-separation tags, so collision probability is cryptographically
//! negligible without any central id counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Domain-separation tag for question id derivation
const QUESTION_ID_TAG: &[u8] = b"openquery:question:v1";

/// Domain-separation tag for answer id derivation
const ANSWER_ID_TAG: &[u8] = b"openquery:answer:v1";

/// Macro to generate UUID-backed ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(ActorId, "actor", "Authenticated caller identity (address-equivalent)");

/// Macro to generate 32-byte digest-backed entity ID types
macro_rules! define_digest_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Create from raw digest bytes
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get the raw digest bytes
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Hex encoding without the display prefix
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, hex::encode(self.0))
            }
        }
    };
}

define_digest_id_type!(QuestionId, "q", "Unique identifier for a question, derived from its creation inputs");
define_digest_id_type!(AnswerId, "ans", "Unique identifier for an answer, derived from its submission inputs");

impl QuestionId {
    /// Derive a question id from asker identity, question text, and creation time
    pub fn derive(asker: &ActorId, text: &str, created_at: DateTime<Utc>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(QUESTION_ID_TAG);
        hasher.update(asker.0.as_bytes());
        hasher.update(text.as_bytes());
        hasher.update(created_at.timestamp_millis().to_be_bytes());
        Self(hasher.finalize().into())
    }
}

impl AnswerId {
    /// Derive an answer id from the parent question, responder, text,
    /// creation time, and a per-question sequence number.
    ///
    /// The sequence keeps two identical submissions in the same millisecond
    /// from colliding.
    pub fn derive(
        question_id: &QuestionId,
        responder: &ActorId,
        text: &str,
        created_at: DateTime<Utc>,
        sequence: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ANSWER_ID_TAG);
        hasher.update(question_id.as_bytes());
        hasher.update(responder.0.as_bytes());
        hasher.update(text.as_bytes());
        hasher.update(created_at.timestamp_millis().to_be_bytes());
        hasher.update(sequence.to_be_bytes());
        Self(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_roundtrip() {
        let id = ActorId::new();
        let parsed = ActorId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_question_id_deterministic() {
        let asker = ActorId::new();
        let now = Utc::now();
        let a = QuestionId::derive(&asker, "What is the airspeed of a laden swallow?", now);
        let b = QuestionId::derive(&asker, "What is the airspeed of a laden swallow?", now);
        assert_eq!(a, b);
    }

    #[test]
    fn test_question_id_varies_with_inputs() {
        let asker = ActorId::new();
        let other = ActorId::new();
        let now = Utc::now();
        let a = QuestionId::derive(&asker, "same text", now);
        assert_ne!(a, QuestionId::derive(&other, "same text", now));
        assert_ne!(a, QuestionId::derive(&asker, "other text", now));
    }

    #[test]
    fn test_answer_id_sequence_separates_duplicates() {
        let asker = ActorId::new();
        let responder = ActorId::new();
        let now = Utc::now();
        let qid = QuestionId::derive(&asker, "q", now);
        let a = AnswerId::derive(&qid, &responder, "same answer", now, 0);
        let b = AnswerId::derive(&qid, &responder, "same answer", now, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_prefixes() {
        let asker = ActorId::new();
        let now = Utc::now();
        let qid = QuestionId::derive(&asker, "q", now);
        assert!(qid.to_string().starts_with("q_"));
        assert_eq!(qid.to_hex().len(), 64);
    }
}
