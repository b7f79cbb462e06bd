//! [`ChangeID`] — the causal identity of one change.

use serde::{Deserialize, Serialize};

use crate::clock::ActorID;

/// Identifies a change by the issuing actor, the actor-local sequence
/// number and the Lamport time at which it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeID {
    pub client_seq: u32,
    pub lamport: u64,
    pub actor: ActorID,
}

/// The id a freshly created document starts from.
pub const INITIAL_CHANGE_ID: ChangeID = ChangeID {
    client_seq: 0,
    lamport: 0,
    actor: ActorID::nil(),
};

impl ChangeID {
    pub const fn new(client_seq: u32, lamport: u64, actor: ActorID) -> Self {
        Self {
            client_seq,
            lamport,
            actor,
        }
    }

    /// The id of the next local change.
    pub fn next(&self) -> ChangeID {
        ChangeID {
            client_seq: self.client_seq + 1,
            lamport: self.lamport + 1,
            actor: self.actor,
        }
    }

    /// Advance the Lamport clock past a remote event: the result is
    /// strictly greater than both the local time and `remote_lamport`.
    pub fn sync_lamport(&self, remote_lamport: u64) -> ChangeID {
        ChangeID {
            lamport: self.lamport.max(remote_lamport) + 1,
            ..*self
        }
    }

    /// The same id stamped with a different actor.
    pub fn set_actor(&self, actor: ActorID) -> ChangeID {
        ChangeID { actor, ..*self }
    }
}
