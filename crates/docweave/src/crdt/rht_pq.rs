//! History-preserving replicated hash table: `key → Element` where every
//! write for a key is kept in a per-key priority queue ordered by the
//! element's creation ticket.
//!
//! Reads observe only the newest node for a key, so concurrent writers
//! converge on the element with the greatest ticket. Losing writers stay
//! in the queue: a remote operation that addresses one of them by creation
//! ticket still finds a well-defined target.

use std::collections::{BTreeMap, HashMap};

use docweave_pq::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::clock::Ticket;
use crate::crdt::elements::Element;

/// One entry in a per-key queue. The node owns its element; tombstoning
/// mutates the element in place and never restructures the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhtPqNode {
    key: String,
    elem: Element,
}

impl RhtPqNode {
    fn new(key: String, elem: Element) -> Self {
        Self { key, elem }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn element(&self) -> &Element {
        &self.elem
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.elem
    }

    pub fn is_removed(&self) -> bool {
        self.elem.is_removed()
    }
}

// Queue order is the creation-ticket order alone; tombstone state is
// deliberately not part of it.
impl PartialEq for RhtPqNode {
    fn eq(&self, other: &Self) -> bool {
        self.elem.created_at() == other.elem.created_at()
    }
}

impl Eq for RhtPqNode {}

impl Ord for RhtPqNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.elem.created_at().cmp(&other.elem.created_at())
    }
}

impl PartialOrd for RhtPqNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Replicated `String → Element` map that preserves write history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RhtPq {
    queues: HashMap<String, PriorityQueue<RhtPqNode>>,
}

impl RhtPq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `elem` under `key`. Re-delivery of an element already in
    /// the queue is ignored, which keeps application idempotent.
    pub fn set(&mut self, key: &str, elem: Element) {
        let queue = self.queues.entry(key.to_owned()).or_default();
        if queue
            .iter()
            .any(|node| node.elem.created_at() == elem.created_at())
        {
            return;
        }
        queue.push(RhtPqNode::new(key.to_owned(), elem));
    }

    /// The newest node for `key`, tombstoned or not.
    pub fn peek(&self, key: &str) -> Option<&RhtPqNode> {
        self.queues.get(key)?.peek()
    }

    /// The element visible under `key`, if the newest node is live.
    pub fn get(&self, key: &str) -> Option<&Element> {
        let node = self.peek(key)?;
        if node.is_removed() {
            None
        } else {
            Some(&node.elem)
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Tombstone the newest node for `key`, returning the element it holds.
    pub fn delete(&mut self, key: &str, removed_at: Ticket) -> Option<&Element> {
        let node = self.queues.get_mut(key)?.peek_mut()?;
        node.elem.remove(removed_at);
        Some(&node.elem)
    }

    /// Tombstone the node created at `created_at`, wherever it sits in the
    /// history. A miss is logged and ignored.
    pub fn delete_by_created_at(
        &mut self,
        created_at: Ticket,
        removed_at: Ticket,
    ) -> Option<&Element> {
        let found = self
            .queues
            .values_mut()
            .flat_map(|queue| queue.iter_mut())
            .find(|node| node.elem.created_at() == created_at);
        match found {
            Some(node) => {
                node.elem.remove(removed_at);
                Some(&node.elem)
            }
            None => {
                tracing::warn!(ticket = %created_at, "no map node for ticket");
                None
            }
        }
    }

    /// Live `key → element` pairs (newest node per key, if live), ordered
    /// by key.
    pub fn elements(&self) -> BTreeMap<&str, &Element> {
        self.queues
            .iter()
            .filter_map(|(key, queue)| {
                let node = queue.peek()?;
                if node.is_removed() {
                    None
                } else {
                    Some((key.as_str(), &node.elem))
                }
            })
            .collect()
    }

    /// Every node in every queue, including tombstones and superseded
    /// writers.
    pub fn all_nodes(&self) -> impl Iterator<Item = &RhtPqNode> {
        self.queues.values().flat_map(|queue| queue.iter())
    }

    pub fn all_nodes_mut(&mut self) -> impl Iterator<Item = &mut RhtPqNode> {
        self.queues.values_mut().flat_map(|queue| queue.iter_mut())
    }

    pub fn marshal(&self) -> String {
        let mut out = String::from("{");
        for (idx, (key, elem)) in self.elements().into_iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(&serde_json::Value::from(key).to_string());
            out.push(':');
            out.push_str(&elem.marshal());
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ActorID, Ticket, ACTOR_ID_LEN};
    use crate::crdt::elements::{Primitive, PrimitiveValue};

    fn actor(last: u8) -> ActorID {
        let mut bytes = [0u8; ACTOR_ID_LEN];
        bytes[ACTOR_ID_LEN - 1] = last;
        ActorID::from_bytes(bytes)
    }

    fn prim(text: &str, lamport: u64, delimiter: u32, a: u8) -> Element {
        Element::Primitive(Primitive::new(
            PrimitiveValue::String(text.to_owned()),
            Ticket::new(lamport, delimiter, actor(a)),
        ))
    }

    #[test]
    fn set_and_get() {
        let mut map = RhtPq::new();
        map.set("name", prim("ada", 1, 1, 1));
        assert!(map.has("name"));
        assert_eq!(map.get("name").unwrap().marshal(), "\"ada\"");
    }

    #[test]
    fn newest_writer_wins() {
        let mut map = RhtPq::new();
        map.set("k", prim("older", 1, 1, 1));
        map.set("k", prim("newer", 1, 1, 2));
        assert_eq!(map.get("k").unwrap().marshal(), "\"newer\"");

        // Same outcome regardless of arrival order.
        let mut reversed = RhtPq::new();
        reversed.set("k", prim("newer", 1, 1, 2));
        reversed.set("k", prim("older", 1, 1, 1));
        assert_eq!(reversed.marshal(), map.marshal());
    }

    #[test]
    fn set_is_idempotent() {
        let mut map = RhtPq::new();
        map.set("k", prim("v", 1, 1, 1));
        map.set("k", prim("v", 1, 1, 1));
        assert_eq!(map.all_nodes().count(), 1);
    }

    #[test]
    fn delete_tombstones_the_top() {
        let mut map = RhtPq::new();
        map.set("k", prim("v", 1, 1, 1));
        let removed = map.delete("k", Ticket::new(2, 1, actor(1))).unwrap();
        assert!(removed.is_removed());
        assert!(!map.has("k"));
        assert_eq!(map.marshal(), "{}");
    }

    #[test]
    fn peek_sees_tombstoned_top() {
        let mut map = RhtPq::new();
        map.set("k", prim("v", 1, 1, 1));
        map.delete("k", Ticket::new(2, 1, actor(1)));
        assert!(map.peek("k").unwrap().is_removed());
        assert!(map.get("k").is_none());
    }

    #[test]
    fn losing_writer_stays_addressable() {
        let mut map = RhtPq::new();
        map.set("k", prim("loser", 1, 1, 1));
        map.set("k", prim("winner", 1, 1, 2));

        // Tombstoning the loser by its creation ticket does not disturb
        // the visible winner.
        let removed = map
            .delete_by_created_at(Ticket::new(1, 1, actor(1)), Ticket::new(2, 1, actor(3)))
            .unwrap();
        assert!(removed.is_removed());
        assert_eq!(map.get("k").unwrap().marshal(), "\"winner\"");
    }

    #[test]
    fn delete_by_created_at_miss_is_a_noop() {
        let mut map = RhtPq::new();
        map.set("k", prim("v", 1, 1, 1));
        let miss = map.delete_by_created_at(Ticket::new(9, 9, actor(9)), Ticket::new(10, 1, actor(1)));
        assert!(miss.is_none());
        assert!(map.has("k"));
    }

    #[test]
    fn marshal_sorts_keys() {
        let mut map = RhtPq::new();
        map.set("b", prim("2", 1, 1, 1));
        map.set("a", prim("1", 1, 2, 1));
        assert_eq!(map.marshal(), r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn all_nodes_includes_history() {
        let mut map = RhtPq::new();
        map.set("k", prim("first", 1, 1, 1));
        map.set("k", prim("second", 2, 1, 1));
        map.delete("k", Ticket::new(3, 1, actor(1)));
        assert_eq!(map.all_nodes().count(), 2);
    }
}
