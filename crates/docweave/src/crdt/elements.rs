//! The element family: everything that can be placed inside a container.
//!
//! | Variant     | Semantics                                   |
//! |-------------|---------------------------------------------|
//! | `Object`    | JSON object backed by a history-keeping map |
//! | `Array`     | JSON array backed by a replicated sequence  |
//! | `Primitive` | Immutable leaf value                        |
//!
//! Every element carries its creation ticket (its identity) and an
//! optional removal ticket (its tombstone). Removal is monotonic: a later
//! removal supersedes an earlier one, earlier ones are silently ignored.

use serde::{Deserialize, Serialize};

use crate::clock::Ticket;
use crate::crdt::rga::Rga;
use crate::crdt::rht_pq::RhtPq;

// ── Primitive ──────────────────────────────────────────────────────────────

/// Leaf value of a [`Primitive`] element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

/// Immutable leaf element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Primitive {
    value: PrimitiveValue,
    created_at: Ticket,
    removed_at: Option<Ticket>,
}

impl Primitive {
    pub fn new(value: PrimitiveValue, created_at: Ticket) -> Self {
        Self {
            value,
            created_at,
            removed_at: None,
        }
    }

    pub fn value(&self) -> &PrimitiveValue {
        &self.value
    }

    pub fn marshal(&self) -> String {
        match &self.value {
            PrimitiveValue::Null => serde_json::Value::Null.to_string(),
            PrimitiveValue::Bool(b) => serde_json::Value::from(*b).to_string(),
            PrimitiveValue::Integer(n) => serde_json::Value::from(*n).to_string(),
            // NaN and infinities have no JSON form and render as null.
            PrimitiveValue::Double(d) => serde_json::Value::from(*d).to_string(),
            PrimitiveValue::String(s) => serde_json::Value::from(s.as_str()).to_string(),
        }
    }
}

// ── Object ─────────────────────────────────────────────────────────────────

/// JSON-object element wrapping a history-keeping member map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    members: RhtPq,
}

impl Object {
    pub fn new(created_at: Ticket) -> Self {
        Self {
            created_at,
            removed_at: None,
            members: RhtPq::new(),
        }
    }

    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    pub fn set(&mut self, key: &str, elem: Element) {
        self.members.set(key, elem);
    }

    pub fn get(&self, key: &str) -> Option<&Element> {
        self.members.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.members.has(key)
    }

    /// Tombstone the member visible under `key`.
    pub fn delete(&mut self, key: &str, removed_at: Ticket) -> Option<&Element> {
        self.members.delete(key, removed_at)
    }

    /// Tombstone the member created at `created_at`, current or historical.
    pub fn delete_by_created_at(
        &mut self,
        created_at: Ticket,
        removed_at: Ticket,
    ) -> Option<&Element> {
        self.members.delete_by_created_at(created_at, removed_at)
    }

    /// Live member keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.members
            .elements()
            .into_keys()
            .map(str::to_owned)
            .collect()
    }

    pub fn members(&self) -> &RhtPq {
        &self.members
    }

    pub fn marshal(&self) -> String {
        self.members.marshal()
    }
}

// ── Array ──────────────────────────────────────────────────────────────────

/// JSON-array element wrapping a replicated sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Array {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    elements: Rga,
}

impl Array {
    pub fn new(created_at: Ticket) -> Self {
        Self {
            created_at,
            removed_at: None,
            elements: Rga::new(),
        }
    }

    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    /// Insert `elem` after the element created at `prev`. The array's own
    /// ticket addresses the front of the sequence.
    pub fn insert_after(&mut self, prev: Ticket, elem: Element) {
        let prev = if prev == self.created_at {
            None
        } else {
            Some(prev)
        };
        self.elements.insert_after(prev, elem);
    }

    /// Tombstone the element created at `created_at`.
    pub fn delete_by_created_at(
        &mut self,
        created_at: Ticket,
        removed_at: Ticket,
    ) -> Option<&Element> {
        self.elements.delete_by_created_at(created_at, removed_at)
    }

    /// Insertion anchor for an append: the ticket of the final node, or
    /// the array's own ticket while empty.
    pub fn last_created_at(&self) -> Ticket {
        self.elements.last_created_at().unwrap_or(self.created_at)
    }

    /// The live element at `index`.
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn sequence(&self) -> &Rga {
        &self.elements
    }

    pub fn marshal(&self) -> String {
        self.elements.marshal()
    }
}

// ── Element ────────────────────────────────────────────────────────────────

/// Any node of the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Element {
    Object(Object),
    Array(Array),
    Primitive(Primitive),
}

impl Element {
    pub fn created_at(&self) -> Ticket {
        match self {
            Element::Object(o) => o.created_at,
            Element::Array(a) => a.created_at,
            Element::Primitive(p) => p.created_at,
        }
    }

    pub fn removed_at(&self) -> Option<Ticket> {
        match self {
            Element::Object(o) => o.removed_at,
            Element::Array(a) => a.removed_at,
            Element::Primitive(p) => p.removed_at,
        }
    }

    /// Tombstone this element. Only a removal strictly later than the
    /// current one takes effect; returns whether the tombstone changed.
    pub fn remove(&mut self, removed_at: Ticket) -> bool {
        let slot = match self {
            Element::Object(o) => &mut o.removed_at,
            Element::Array(a) => &mut a.removed_at,
            Element::Primitive(p) => &mut p.removed_at,
        };
        match slot {
            Some(current) if !removed_at.after(current) => false,
            _ => {
                *slot = Some(removed_at);
                true
            }
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at().is_some()
    }

    pub fn marshal(&self) -> String {
        match self {
            Element::Object(o) => o.marshal(),
            Element::Array(a) => a.marshal(),
            Element::Primitive(p) => p.marshal(),
        }
    }

    pub fn deep_copy(&self) -> Element {
        self.clone()
    }

    /// Locate the element created at `created_at` in this subtree,
    /// including tombstoned nodes and superseded concurrent writers.
    pub fn find_by_created_at(&self, created_at: Ticket) -> Option<&Element> {
        if self.created_at() == created_at {
            return Some(self);
        }
        match self {
            Element::Object(o) => o
                .members
                .all_nodes()
                .find_map(|node| node.element().find_by_created_at(created_at)),
            Element::Array(a) => a
                .elements
                .all_nodes()
                .find_map(|node| node.element().find_by_created_at(created_at)),
            Element::Primitive(_) => None,
        }
    }

    pub fn find_by_created_at_mut(&mut self, created_at: Ticket) -> Option<&mut Element> {
        if self.created_at() == created_at {
            return Some(self);
        }
        match self {
            Element::Object(o) => o
                .members
                .all_nodes_mut()
                .find_map(|node| node.element_mut().find_by_created_at_mut(created_at)),
            Element::Array(a) => a
                .elements
                .all_nodes_mut()
                .find_map(|node| node.element_mut().find_by_created_at_mut(created_at)),
            Element::Primitive(_) => None,
        }
    }
}
