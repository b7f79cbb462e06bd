//! Conflict-free data structures holding the document state.
//!
//! This module provides:
//! - The element family ([`elements`]): objects, arrays and primitive
//!   leaves, all carrying creation tickets and tombstones.
//! - The two replicated hash tables: a last-writer-wins string map
//!   ([`rht`]) and the history-preserving element map ([`rht_pq`]).
//! - The replicated sequence backing arrays ([`rga`]).
//! - The document [`root`].

pub mod elements;
pub mod rga;
pub mod rht;
pub mod rht_pq;
pub mod root;

pub use elements::{Array, Element, Object, Primitive, PrimitiveValue};
pub use rga::Rga;
pub use rht::{Rht, RhtNode, SetPolicy};
pub use rht_pq::{RhtPq, RhtPqNode};
pub use root::Root;
