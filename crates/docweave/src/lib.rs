//! docweave — a client-side replicated JSON document.
//!
//! A [`Document`] holds a JSON-shaped state that multiple replicas edit
//! concurrently. Local edits are staged through [`Document::update`],
//! bundled into change packs for a server, and remote packs are replayed
//! with [`Document::apply_change_pack`]; replicas that see the same set of
//! changes converge to the same serialized state.
//!
//! Module map:
//! - [`clock`] — Lamport tickets and actor identity.
//! - [`crdt`] — the conflict-free containers holding the state.
//! - [`change`] — changes, operations, checkpoints and packs.
//! - [`document`] — the controller and the edit proxies.
//! - [`codec`] — the snapshot byte boundary.

pub mod change;
pub mod clock;
pub mod codec;
pub mod crdt;
pub mod document;

pub use change::{
    ApplyError, Change, ChangeContext, ChangeID, Checkpoint, DocKey, Operation, Pack,
    INITIAL_CHANGE_ID, INITIAL_CHECKPOINT,
};
pub use clock::{ActorID, ParseActorError, Ticket, INITIAL_TICKET};
pub use codec::{bytes_to_object, object_to_bytes, DecodeError, EncodeError};
pub use crdt::{Array, Element, Object, Primitive, PrimitiveValue, Rht, RhtPq, Root, SetPolicy};
pub use document::{ArrayProxy, DocState, Document, DocumentError, ObjectProxy, UpdaterError};
