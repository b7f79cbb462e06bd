//! Last-writer-wins replicated hash table for string members.
//!
//! Nodes are kept in an append-only arena so that superseded entries stay
//! addressable through the ticket index: a remote removal that references
//! an entry which has since been overwritten tombstones the stale node and
//! leaves the current one untouched.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::clock::Ticket;

/// One `key → value` entry together with its causal metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhtNode {
    key: String,
    value: String,
    updated_at: Ticket,
    removed_at: Option<Ticket>,
}

impl RhtNode {
    fn new(key: String, value: String, updated_at: Ticket) -> Self {
        Self {
            key,
            value,
            updated_at,
            removed_at: None,
        }
    }

    /// Tombstone this node. Removal is monotonic: only a strictly later
    /// ticket overwrites an existing tombstone.
    pub fn remove(&mut self, removed_at: Ticket) -> bool {
        match self.removed_at {
            Some(current) if !removed_at.after(&current) => false,
            _ => {
                self.removed_at = Some(removed_at);
                true
            }
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn updated_at(&self) -> Ticket {
        self.updated_at
    }

    pub fn removed_at(&self) -> Option<Ticket> {
        self.removed_at
    }
}

/// How `set` treats a write whose ticket is not newer than the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SetPolicy {
    /// Ignore writes whose `updated_at` is not strictly newer than the
    /// node currently stored under the key.
    #[default]
    LastWriteWins,
    /// Replace unconditionally, whatever the tickets say.
    AlwaysOverwrite,
}

/// Replicated `String → String` map with last-writer-wins conflict
/// resolution and tombstoned removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rht {
    policy: SetPolicy,
    nodes: Vec<RhtNode>,
    by_key: HashMap<String, usize>,
    by_ticket: HashMap<String, usize>,
}

impl Rht {
    pub fn new() -> Self {
        Self::with_policy(SetPolicy::default())
    }

    pub fn with_policy(policy: SetPolicy) -> Self {
        Self {
            policy,
            nodes: Vec::new(),
            by_key: HashMap::new(),
            by_ticket: HashMap::new(),
        }
    }

    pub fn policy(&self) -> SetPolicy {
        self.policy
    }

    /// Write `value` under `key`. Returns `false` if the write lost the
    /// last-writer-wins comparison and was ignored.
    pub fn set(&mut self, key: &str, value: &str, updated_at: Ticket) -> bool {
        if self.policy == SetPolicy::LastWriteWins {
            if let Some(&idx) = self.by_key.get(key) {
                if !updated_at.after(&self.nodes[idx].updated_at) {
                    return false;
                }
            }
        }

        let idx = self.nodes.len();
        self.nodes
            .push(RhtNode::new(key.to_owned(), value.to_owned(), updated_at));
        self.by_key.insert(key.to_owned(), idx);
        self.by_ticket.insert(updated_at.key(), idx);
        true
    }

    /// Tombstone the current node at `key`, returning its value.
    pub fn remove(&mut self, key: &str, removed_at: Ticket) -> Option<&str> {
        let &idx = self.by_key.get(key)?;
        let node = &mut self.nodes[idx];
        node.remove(removed_at);
        Some(&node.value)
    }

    /// Tombstone the node written by the given ticket, wherever it sits in
    /// the history. A miss is logged and ignored.
    pub fn remove_by_created_at(&mut self, created_at: Ticket, removed_at: Ticket) -> Option<&str> {
        match self.by_ticket.get(&created_at.key()) {
            Some(&idx) => {
                let node = &mut self.nodes[idx];
                node.remove(removed_at);
                Some(&node.value)
            }
            None => {
                tracing::warn!(ticket = %created_at, "no rht node for ticket");
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let &idx = self.by_key.get(key)?;
        let node = &self.nodes[idx];
        if node.is_removed() {
            None
        } else {
            Some(&node.value)
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Live `key → value` pairs, ordered by key.
    pub fn elements(&self) -> BTreeMap<&str, &str> {
        self.by_key
            .values()
            .map(|&idx| &self.nodes[idx])
            .filter(|node| !node.is_removed())
            .map(|node| (node.key(), node.value()))
            .collect()
    }

    /// Every node currently reachable by key, tombstoned or not.
    pub fn all_nodes(&self) -> impl Iterator<Item = &RhtNode> {
        self.by_key.values().map(|&idx| &self.nodes[idx])
    }

    pub fn marshal(&self) -> String {
        let mut out = String::from("{");
        for (idx, (key, value)) in self.elements().into_iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(&serde_json::Value::from(key).to_string());
            out.push(':');
            out.push_str(&serde_json::Value::from(value).to_string());
        }
        out.push('}');
        out
    }
}

impl Default for Rht {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ActorID, Ticket};

    fn t(lamport: u64, delimiter: u32) -> Ticket {
        Ticket::new(lamport, delimiter, ActorID::nil())
    }

    #[test]
    fn set_and_get() {
        let mut rht = Rht::new();
        rht.set("color", "red", t(1, 1));
        assert_eq!(rht.get("color"), Some("red"));
        assert!(rht.has("color"));
        assert!(!rht.has("shape"));
    }

    #[test]
    fn last_writer_wins_rejects_stale_write() {
        let mut rht = Rht::new();
        assert!(rht.set("k", "new", t(5, 1)));
        assert!(!rht.set("k", "old", t(3, 1)));
        assert!(!rht.set("k", "same", t(5, 1)));
        assert_eq!(rht.get("k"), Some("new"));
    }

    #[test]
    fn overwrite_policy_replaces_unconditionally() {
        let mut rht = Rht::with_policy(SetPolicy::AlwaysOverwrite);
        rht.set("k", "new", t(5, 1));
        assert!(rht.set("k", "old", t(3, 1)));
        assert_eq!(rht.get("k"), Some("old"));
    }

    #[test]
    fn remove_hides_key() {
        let mut rht = Rht::new();
        rht.set("k", "v", t(1, 1));
        assert_eq!(rht.remove("k", t(2, 1)), Some("v"));
        assert_eq!(rht.get("k"), None);
        assert!(!rht.has("k"));
        assert_eq!(rht.marshal(), "{}");
    }

    #[test]
    fn removal_is_monotonic() {
        let mut rht = Rht::new();
        rht.set("k", "v", t(1, 1));
        rht.remove("k", t(9, 1));
        rht.remove("k", t(4, 1));
        let node = rht.all_nodes().next().unwrap();
        assert_eq!(node.removed_at(), Some(t(9, 1)));
    }

    #[test]
    fn remove_by_created_at_targets_stale_history() {
        let mut rht = Rht::new();
        rht.set("k", "first", t(1, 1));
        rht.set("k", "second", t(2, 1));
        // Tombstoning the superseded node leaves the live one visible.
        assert_eq!(rht.remove_by_created_at(t(1, 1), t(3, 1)), Some("first"));
        assert_eq!(rht.get("k"), Some("second"));
    }

    #[test]
    fn remove_by_created_at_miss_is_a_noop() {
        let mut rht = Rht::new();
        rht.set("k", "v", t(1, 1));
        assert_eq!(rht.remove_by_created_at(t(42, 1), t(43, 1)), None);
        assert_eq!(rht.get("k"), Some("v"));
    }

    #[test]
    fn marshal_sorts_keys_and_escapes() {
        let mut rht = Rht::new();
        rht.set("b", "2", t(1, 1));
        rht.set("a", "1", t(1, 2));
        rht.set("quote\"", "\\", t(1, 3));
        assert_eq!(rht.marshal(), r#"{"a":"1","b":"2","quote\"":"\\"}"#);
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut rht = Rht::new();
        rht.set("k", "v", t(1, 1));
        let copy = rht.clone();
        rht.remove("k", t(2, 1));
        assert_eq!(copy.get("k"), Some("v"));
        assert_eq!(rht.get("k"), None);
    }
}
