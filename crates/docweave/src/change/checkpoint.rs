//! [`Checkpoint`] — mutual progress between this replica and the server.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `(server_seq, client_seq)`: the last server sequence this replica has
/// consumed and the last local sequence the server has acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub server_seq: u64,
    pub client_seq: u32,
}

/// The checkpoint of a document that has never synchronized.
pub const INITIAL_CHECKPOINT: Checkpoint = Checkpoint {
    server_seq: 0,
    client_seq: 0,
};

impl Checkpoint {
    pub const fn new(server_seq: u64, client_seq: u32) -> Self {
        Self {
            server_seq,
            client_seq,
        }
    }

    pub fn next_server_seq(&self, server_seq: u64) -> Checkpoint {
        Checkpoint {
            server_seq,
            client_seq: self.client_seq,
        }
    }

    pub fn increase_client_seq(&self, inc: u32) -> Checkpoint {
        Checkpoint {
            server_seq: self.server_seq,
            client_seq: self.client_seq + inc,
        }
    }

    /// Component-wise maximum of both checkpoints.
    pub fn forward(&self, other: &Checkpoint) -> Checkpoint {
        Checkpoint {
            server_seq: self.server_seq.max(other.server_seq),
            client_seq: self.client_seq.max(other.client_seq),
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "serverSeq={}, clientSeq={}",
            self.server_seq, self.client_seq
        )
    }
}
