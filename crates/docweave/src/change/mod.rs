//! Changes and their causal metadata.
//!
//! A [`Change`] is an ordered batch of operations sharing one
//! [`ChangeID`]. Changes are produced locally by a
//! [`ChangeContext`](context::ChangeContext) and exchanged with the server
//! inside [`Pack`](pack::Pack)s.

pub mod checkpoint;
pub mod context;
pub mod id;
pub mod operations;
pub mod pack;

pub use checkpoint::{Checkpoint, INITIAL_CHECKPOINT};
pub use context::ChangeContext;
pub use id::{ChangeID, INITIAL_CHANGE_ID};
pub use operations::{ApplyError, Operation};
pub use pack::{DocKey, Pack};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::ActorID;
use crate::crdt::Root;

/// An ordered batch of operations with a single causal identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    id: ChangeID,
    message: String,
    operations: Vec<Operation>,
}

impl Change {
    pub fn new(id: ChangeID, message: String, operations: Vec<Operation>) -> Self {
        Self {
            id,
            message,
            operations,
        }
    }

    pub fn id(&self) -> ChangeID {
        self.id
    }

    pub fn client_seq(&self) -> u32 {
        self.id.client_seq
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Replay every operation on `root`, in order.
    pub fn execute(&self, root: &mut Root) -> Result<(), ApplyError> {
        for op in &self.operations {
            op.execute(root)?;
        }
        Ok(())
    }

    /// Restamp the change and its operations with `actor`.
    pub fn set_actor(&mut self, actor: ActorID) {
        self.id = self.id.set_actor(actor);
        for op in &mut self.operations {
            op.set_actor(actor);
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "change {}.{} ({} ops)",
            self.id.lamport,
            self.id.client_seq,
            self.operations.len()
        )
    }
}
