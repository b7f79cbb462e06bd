//! The operations a change replays against a document root.
//!
//! Each variant addresses its target container by creation ticket and
//! carries the ticket of its own execution, so replaying the same set of
//! operations in any order on any replica converges: container writes are
//! resolved by ticket comparison inside the containers themselves.

use thiserror::Error;

use serde::{Deserialize, Serialize};

use crate::clock::{ActorID, Ticket};
use crate::crdt::{Element, Root};

/// Replay failure. Only structural problems are fatal; a missing target
/// *inside* a resolved container is a warn-level no-op handled by the
/// container.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("no element for ticket {0}")]
    TargetNotFound(String),
    #[error("element {0} cannot be mutated by this operation")]
    UnexpectedTarget(String),
}

/// A single mutation recorded by a proxy and replayed by
/// [`Change::execute`](crate::change::Change::execute).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Publish `value` under `key` in the object created at `parent`.
    Set {
        parent: Ticket,
        key: String,
        value: Element,
        executed_at: Ticket,
    },
    /// Insert `value` after the element created at `prev` in the array
    /// created at `parent`; `prev == parent` addresses the front.
    Add {
        parent: Ticket,
        prev: Ticket,
        value: Element,
        executed_at: Ticket,
    },
    /// Tombstone the element created at `target` inside the container
    /// created at `parent`.
    Remove {
        parent: Ticket,
        target: Ticket,
        executed_at: Ticket,
    },
}

impl Operation {
    pub fn executed_at(&self) -> Ticket {
        match self {
            Operation::Set { executed_at, .. }
            | Operation::Add { executed_at, .. }
            | Operation::Remove { executed_at, .. } => *executed_at,
        }
    }

    /// Restamp the execution ticket with `actor`. Tickets that address
    /// other elements (`parent`, `prev`, `target`, the value's creation
    /// ticket) are left alone: they must keep matching whatever the
    /// referenced elements were created with.
    pub fn set_actor(&mut self, actor: ActorID) {
        match self {
            Operation::Set { executed_at, .. }
            | Operation::Add { executed_at, .. }
            | Operation::Remove { executed_at, .. } => {
                *executed_at = executed_at.with_actor(actor);
            }
        }
    }

    /// Apply this operation to `root`.
    pub fn execute(&self, root: &mut Root) -> Result<(), ApplyError> {
        match self {
            Operation::Set {
                parent, key, value, ..
            } => match root.find_by_created_at_mut(*parent) {
                Some(Element::Object(object)) => {
                    object.set(key, value.deep_copy());
                    Ok(())
                }
                Some(_) => Err(ApplyError::UnexpectedTarget(parent.key())),
                None => Err(ApplyError::TargetNotFound(parent.key())),
            },
            Operation::Add {
                parent, prev, value, ..
            } => match root.find_by_created_at_mut(*parent) {
                Some(Element::Array(array)) => {
                    array.insert_after(*prev, value.deep_copy());
                    Ok(())
                }
                Some(_) => Err(ApplyError::UnexpectedTarget(parent.key())),
                None => Err(ApplyError::TargetNotFound(parent.key())),
            },
            Operation::Remove {
                parent,
                target,
                executed_at,
            } => match root.find_by_created_at_mut(*parent) {
                Some(Element::Object(object)) => {
                    object.delete_by_created_at(*target, *executed_at);
                    Ok(())
                }
                Some(Element::Array(array)) => {
                    array.delete_by_created_at(*target, *executed_at);
                    Ok(())
                }
                Some(Element::Primitive(_)) => Err(ApplyError::UnexpectedTarget(parent.key())),
                None => Err(ApplyError::TargetNotFound(parent.key())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ActorID, Ticket, ACTOR_ID_LEN, INITIAL_TICKET};
    use crate::crdt::{Object, Primitive, PrimitiveValue};

    fn t(lamport: u64, delimiter: u32) -> Ticket {
        Ticket::new(lamport, delimiter, ActorID::nil())
    }

    fn string_elem(s: &str, at: Ticket) -> Element {
        Element::Primitive(Primitive::new(PrimitiveValue::String(s.to_owned()), at))
    }

    fn empty_root() -> Root {
        Root::new(Object::new(INITIAL_TICKET))
    }

    #[test]
    fn set_publishes_member() {
        let mut root = empty_root();
        let op = Operation::Set {
            parent: INITIAL_TICKET,
            key: "k".to_owned(),
            value: string_elem("v", t(1, 1)),
            executed_at: t(1, 1),
        };
        op.execute(&mut root).unwrap();
        assert_eq!(root.marshal(), r#"{"k":"v"}"#);
    }

    #[test]
    fn set_on_missing_parent_fails() {
        let mut root = empty_root();
        let op = Operation::Set {
            parent: t(9, 9),
            key: "k".to_owned(),
            value: string_elem("v", t(1, 1)),
            executed_at: t(1, 1),
        };
        assert!(matches!(
            op.execute(&mut root),
            Err(ApplyError::TargetNotFound(_))
        ));
    }

    #[test]
    fn set_on_primitive_parent_fails() {
        let mut root = empty_root();
        Operation::Set {
            parent: INITIAL_TICKET,
            key: "leaf".to_owned(),
            value: string_elem("v", t(1, 1)),
            executed_at: t(1, 1),
        }
        .execute(&mut root)
        .unwrap();

        let bad = Operation::Set {
            parent: t(1, 1),
            key: "k".to_owned(),
            value: string_elem("w", t(2, 1)),
            executed_at: t(2, 1),
        };
        assert!(matches!(
            bad.execute(&mut root),
            Err(ApplyError::UnexpectedTarget(_))
        ));
    }

    #[test]
    fn remove_tombstones_member() {
        let mut root = empty_root();
        Operation::Set {
            parent: INITIAL_TICKET,
            key: "k".to_owned(),
            value: string_elem("v", t(1, 1)),
            executed_at: t(1, 1),
        }
        .execute(&mut root)
        .unwrap();

        Operation::Remove {
            parent: INITIAL_TICKET,
            target: t(1, 1),
            executed_at: t(2, 1),
        }
        .execute(&mut root)
        .unwrap();

        assert_eq!(root.marshal(), "{}");
    }

    #[test]
    fn remove_with_unknown_target_is_a_noop() {
        let mut root = empty_root();
        Operation::Remove {
            parent: INITIAL_TICKET,
            target: t(9, 9),
            executed_at: t(2, 1),
        }
        .execute(&mut root)
        .unwrap();
        assert_eq!(root.marshal(), "{}");
    }

    #[test]
    fn set_actor_restamps_only_the_execution_ticket() {
        let mut bytes = [0u8; ACTOR_ID_LEN];
        bytes[0] = 7;
        let actor = ActorID::from_bytes(bytes);

        let mut op = Operation::Set {
            parent: INITIAL_TICKET,
            key: "k".to_owned(),
            value: string_elem("v", t(1, 1)),
            executed_at: t(1, 1),
        };
        op.set_actor(actor);

        assert_eq!(op.executed_at().actor, actor);
        if let Operation::Set { parent, value, .. } = &op {
            assert!(parent.actor.is_nil());
            assert!(value.created_at().actor.is_nil());
        }
    }
}
