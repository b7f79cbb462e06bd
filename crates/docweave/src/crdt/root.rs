//! Document root: the top-level object plus identity resolution for the
//! whole tree.

use serde::{Deserialize, Serialize};

use crate::clock::Ticket;
use crate::crdt::elements::{Element, Object};

/// Owns the document tree. Remote operations address elements by their
/// creation ticket through [`Root::find_by_created_at`]; because removal
/// only tombstones, a ticket stays resolvable for as long as the document
/// lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    root: Element,
}

impl Root {
    pub fn new(object: Object) -> Self {
        Self {
            root: Element::Object(object),
        }
    }

    pub fn object(&self) -> &Object {
        match &self.root {
            Element::Object(object) => object,
            _ => unreachable!("document root is always an object"),
        }
    }

    pub fn object_mut(&mut self) -> &mut Object {
        match &mut self.root {
            Element::Object(object) => object,
            _ => unreachable!("document root is always an object"),
        }
    }

    pub fn find_by_created_at(&self, created_at: Ticket) -> Option<&Element> {
        self.root.find_by_created_at(created_at)
    }

    pub fn find_by_created_at_mut(&mut self, created_at: Ticket) -> Option<&mut Element> {
        self.root.find_by_created_at_mut(created_at)
    }

    /// Full structural copy, used to materialize the sandbox clone.
    pub fn deep_copy(&self) -> Root {
        self.clone()
    }

    pub fn marshal(&self) -> String {
        self.root.marshal()
    }
}
