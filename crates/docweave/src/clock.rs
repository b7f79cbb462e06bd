//! Logical time: [`Ticket`] identifiers and [`ActorID`] replica identity.
//!
//! Every event in a document carries a `Ticket` — a Lamport timestamp
//! extended with an intra-change delimiter and the issuing actor. Tickets
//! are totally ordered by `(lamport, actor, delimiter)`, which gives every
//! replica the same winner for any pair of concurrent events.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of raw bytes in an [`ActorID`].
pub const ACTOR_ID_LEN: usize = 12;

// ── ActorID ────────────────────────────────────────────────────────────────

/// Opaque 12-byte replica identity.
///
/// A detached document has the nil actor (all zeroes); a real identity is
/// assigned when the document is attached to a client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ActorID([u8; ACTOR_ID_LEN]);

impl ActorID {
    pub const fn nil() -> Self {
        Self([0; ACTOR_ID_LEN])
    }

    pub const fn from_bytes(bytes: [u8; ACTOR_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// A fresh random identity for a client session.
    pub fn random() -> Self {
        let mut bytes = [0u8; ACTOR_ID_LEN];
        rand::thread_rng().fill(&mut bytes[..]);
        Self(bytes)
    }

    /// Parse from the 24-character lowercase hex form produced by `Display`.
    pub fn from_hex(s: &str) -> Result<Self, ParseActorError> {
        if s.len() != ACTOR_ID_LEN * 2 {
            return Err(ParseActorError::Length(s.len()));
        }
        if !s.is_ascii() {
            return Err(ParseActorError::Digit);
        }
        let mut bytes = [0u8; ACTOR_ID_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| ParseActorError::Digit)?;
        }
        Ok(Self(bytes))
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0; ACTOR_ID_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; ACTOR_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ActorID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Failure to parse an [`ActorID`] from its hex form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseActorError {
    #[error("actor hex must be {expected} chars, got {0}", expected = ACTOR_ID_LEN * 2)]
    Length(usize),
    #[error("actor hex contains a non-hex digit")]
    Digit,
}

// ── Ticket ─────────────────────────────────────────────────────────────────

/// A Lamport-timestamped event identifier: `(lamport, delimiter, actor)`.
///
/// The delimiter orders tickets issued within a single change, where all
/// of them share one lamport value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub lamport: u64,
    pub delimiter: u32,
    pub actor: ActorID,
}

/// The ticket of the document root, shared by every replica.
pub const INITIAL_TICKET: Ticket = Ticket {
    lamport: 0,
    delimiter: 0,
    actor: ActorID::nil(),
};

impl Ticket {
    pub const fn new(lamport: u64, delimiter: u32, actor: ActorID) -> Self {
        Self {
            lamport,
            delimiter,
            actor,
        }
    }

    /// Stable string encoding, usable as a map key and in log output.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.lamport, self.delimiter, self.actor)
    }

    /// Returns `true` if `self` is strictly later than `other` in the
    /// total event order.
    pub fn after(&self, other: &Ticket) -> bool {
        self > other
    }

    /// The same ticket stamped with a different actor.
    pub fn with_actor(&self, actor: ActorID) -> Self {
        Self { actor, ..*self }
    }
}

impl Ord for Ticket {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.lamport
            .cmp(&other.lamport)
            .then_with(|| self.actor.cmp(&other.actor))
            .then_with(|| self.delimiter.cmp(&other.delimiter))
    }
}

impl PartialOrd for Ticket {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
