//! [`ChangeContext`] — the draft state of one in-flight `update`.
//!
//! The context owns the draft change id and a delimiter counter from which
//! every ticket of the change is allocated, plus the operations the proxy
//! records. It either becomes a [`Change`] (the updater returned cleanly
//! and recorded something) or is dropped wholesale.

use crate::change::id::ChangeID;
use crate::change::operations::Operation;
use crate::change::Change;
use crate::clock::Ticket;

#[derive(Debug)]
pub struct ChangeContext {
    id: ChangeID,
    message: String,
    delimiter: u32,
    operations: Vec<Operation>,
}

impl ChangeContext {
    pub fn new(id: ChangeID, message: String) -> Self {
        Self {
            id,
            message,
            delimiter: 0,
            operations: Vec::new(),
        }
    }

    pub fn id(&self) -> ChangeID {
        self.id
    }

    /// Allocate the next ticket of this change. All tickets share the
    /// change's Lamport time and are ordered by the delimiter.
    pub fn issue_ticket(&mut self) -> Ticket {
        self.delimiter += 1;
        Ticket::new(self.id.lamport, self.delimiter, self.id.actor)
    }

    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Freeze the context into a change.
    pub fn into_change(self) -> Change {
        Change::new(self.id, self.message, self.operations)
    }
}
