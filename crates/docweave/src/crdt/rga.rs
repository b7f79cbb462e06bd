//! Replicated growable array backing [`Array`](crate::crdt::Array)
//! elements.
//!
//! A linear-scan sequence of element-owning nodes. Insertion is addressed
//! relative to an existing element's creation ticket; removal only
//! tombstones, so the sequence grows monotonically and stays aligned
//! across replicas.

use serde::{Deserialize, Serialize};

use crate::clock::Ticket;
use crate::crdt::elements::Element;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RgaNode {
    elem: Element,
}

impl RgaNode {
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

/// Ordered element sequence with tombstone-only removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rga {
    nodes: Vec<RgaNode>,
}

impl Rga {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `elem` after the element created at `prev`; `None` inserts
    /// at the front. Among concurrent inserts at the same position the
    /// newer element lands closer to `prev`. Re-delivery of an element
    /// already present is ignored.
    pub fn insert_after(&mut self, prev: Option<Ticket>, elem: Element) {
        if self
            .nodes
            .iter()
            .any(|node| node.elem.created_at() == elem.created_at())
        {
            return;
        }

        let mut pos = match prev {
            None => 0,
            Some(prev) => {
                match self
                    .nodes
                    .iter()
                    .position(|node| node.elem.created_at() == prev)
                {
                    Some(idx) => idx + 1,
                    None => {
                        tracing::warn!(ticket = %prev, "no sequence node for ticket, appending");
                        self.nodes.len()
                    }
                }
            }
        };

        while pos < self.nodes.len() && self.nodes[pos].elem.created_at() > elem.created_at() {
            pos += 1;
        }
        self.nodes.insert(pos, RgaNode { elem });
    }

    /// Tombstone the element created at `created_at`. A miss is logged and
    /// ignored.
    pub fn delete_by_created_at(
        &mut self,
        created_at: Ticket,
        removed_at: Ticket,
    ) -> Option<&Element> {
        match self
            .nodes
            .iter_mut()
            .find(|node| node.elem.created_at() == created_at)
        {
            Some(node) => {
                node.elem.remove(removed_at);
                Some(&node.elem)
            }
            None => {
                tracing::warn!(ticket = %created_at, "no sequence node for ticket");
                None
            }
        }
    }

    /// Creation ticket of the final node in the sequence, tombstoned or
    /// not. Appends anchor to this.
    pub fn last_created_at(&self) -> Option<Ticket> {
        self.nodes.last().map(|node| node.elem.created_at())
    }

    /// The live element at `index`, counting live elements only.
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.iter_live().nth(index)
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.iter_live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter_live().next().is_none()
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &Element> {
        self.nodes
            .iter()
            .filter(|node| !node.is_removed())
            .map(|node| &node.elem)
    }

    /// Every node in sequence order, including tombstones.
    pub fn all_nodes(&self) -> impl Iterator<Item = &RgaNode> {
        self.nodes.iter()
    }

    pub fn all_nodes_mut(&mut self) -> impl Iterator<Item = &mut RgaNode> {
        self.nodes.iter_mut()
    }

    pub fn marshal(&self) -> String {
        let mut out = String::from("[");
        for (idx, elem) in self.iter_live().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push_str(&elem.marshal());
        }
        out.push(']');
        out
    }
}
