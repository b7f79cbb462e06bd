//! Proxies recording operations against the sandbox clone.
//!
//! A proxy fronts one container of the clone. Every mutating call issues
//! a ticket from the change context, records the matching
//! [`Operation`], and applies the same mutation to the clone eagerly so
//! the updater observes its own writes.

use crate::change::{ChangeContext, Operation};
use crate::clock::Ticket;
use crate::crdt::{Array, Element, Object, Primitive, PrimitiveValue, Root};

// ── ObjectProxy ────────────────────────────────────────────────────────────

/// Facade over an object of the clone.
pub struct ObjectProxy<'a> {
    ctx: &'a mut ChangeContext,
    root: &'a mut Root,
    target: Ticket,
}

impl<'a> ObjectProxy<'a> {
    pub(crate) fn new(ctx: &'a mut ChangeContext, root: &'a mut Root, target: Ticket) -> Self {
        Self { ctx, root, target }
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.set_value(key, PrimitiveValue::String(value.to_owned()));
    }

    pub fn set_integer(&mut self, key: &str, value: i64) {
        self.set_value(key, PrimitiveValue::Integer(value));
    }

    pub fn set_double(&mut self, key: &str, value: f64) {
        self.set_value(key, PrimitiveValue::Double(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set_value(key, PrimitiveValue::Bool(value));
    }

    pub fn set_null(&mut self, key: &str) {
        self.set_value(key, PrimitiveValue::Null);
    }

    /// Create an empty object under `key` and return a proxy for it.
    pub fn set_new_object(&mut self, key: &str) -> ObjectProxy<'_> {
        let ticket = self.ctx.issue_ticket();
        self.apply_set(key, Element::Object(Object::new(ticket)), ticket);
        ObjectProxy {
            ctx: &mut *self.ctx,
            root: &mut *self.root,
            target: ticket,
        }
    }

    /// Create an empty array under `key` and return a proxy for it.
    pub fn set_new_array(&mut self, key: &str) -> ArrayProxy<'_> {
        let ticket = self.ctx.issue_ticket();
        self.apply_set(key, Element::Array(Array::new(ticket)), ticket);
        ArrayProxy {
            ctx: &mut *self.ctx,
            root: &mut *self.root,
            target: ticket,
        }
    }

    /// Tombstone the member under `key`, if there is one.
    pub fn remove(&mut self, key: &str) {
        let executed_at = self.ctx.issue_ticket();
        let parent = self.target;
        let removed = self
            .target_object_mut()
            .and_then(|object| object.delete(key, executed_at))
            .map(|elem| elem.created_at());
        if let Some(target) = removed {
            self.ctx.push(Operation::Remove {
                parent,
                target,
                executed_at,
            });
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.target_object().map_or(false, |obj| obj.has(key))
    }

    pub fn keys(&self) -> Vec<String> {
        self.target_object().map(Object::keys).unwrap_or_default()
    }

    fn set_value(&mut self, key: &str, value: PrimitiveValue) {
        let ticket = self.ctx.issue_ticket();
        self.apply_set(key, Element::Primitive(Primitive::new(value, ticket)), ticket);
    }

    fn apply_set(&mut self, key: &str, elem: Element, executed_at: Ticket) {
        self.ctx.push(Operation::Set {
            parent: self.target,
            key: key.to_owned(),
            value: elem.deep_copy(),
            executed_at,
        });
        if let Some(object) = self.target_object_mut() {
            object.set(key, elem);
        }
    }

    fn target_object(&self) -> Option<&Object> {
        match self.root.find_by_created_at(self.target) {
            Some(Element::Object(object)) => Some(object),
            _ => None,
        }
    }

    fn target_object_mut(&mut self) -> Option<&mut Object> {
        match self.root.find_by_created_at_mut(self.target) {
            Some(Element::Object(object)) => Some(object),
            _ => None,
        }
    }
}

// ── ArrayProxy ─────────────────────────────────────────────────────────────

/// Facade over an array of the clone.
pub struct ArrayProxy<'a> {
    ctx: &'a mut ChangeContext,
    root: &'a mut Root,
    target: Ticket,
}

impl<'a> ArrayProxy<'a> {
    pub fn add_string(&mut self, value: &str) {
        self.add_value(PrimitiveValue::String(value.to_owned()));
    }

    pub fn add_integer(&mut self, value: i64) {
        self.add_value(PrimitiveValue::Integer(value));
    }

    pub fn add_double(&mut self, value: f64) {
        self.add_value(PrimitiveValue::Double(value));
    }

    pub fn add_bool(&mut self, value: bool) {
        self.add_value(PrimitiveValue::Bool(value));
    }

    pub fn add_null(&mut self) {
        self.add_value(PrimitiveValue::Null);
    }

    /// Tombstone the live element at `index`. Returns whether anything
    /// was removed.
    pub fn remove(&mut self, index: usize) -> bool {
        let executed_at = self.ctx.issue_ticket();
        let parent = self.target;
        let target = self
            .target_array()
            .and_then(|array| array.get(index))
            .map(|elem| elem.created_at());
        match target {
            Some(target) => {
                if let Some(array) = self.target_array_mut() {
                    array.delete_by_created_at(target, executed_at);
                }
                self.ctx.push(Operation::Remove {
                    parent,
                    target,
                    executed_at,
                });
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.target_array().map_or(0, Array::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_value(&mut self, value: PrimitiveValue) {
        let ticket = self.ctx.issue_ticket();
        let parent = self.target;
        let prev = self
            .target_array()
            .map_or(parent, Array::last_created_at);
        let elem = Element::Primitive(Primitive::new(value, ticket));
        self.ctx.push(Operation::Add {
            parent,
            prev,
            value: elem.deep_copy(),
            executed_at: ticket,
        });
        if let Some(array) = self.target_array_mut() {
            array.insert_after(prev, elem);
        }
    }

    fn target_array(&self) -> Option<&Array> {
        match self.root.find_by_created_at(self.target) {
            Some(Element::Array(array)) => Some(array),
            _ => None,
        }
    }

    fn target_array_mut(&mut self) -> Option<&mut Array> {
        match self.root.find_by_created_at_mut(self.target) {
            Some(Element::Array(array)) => Some(array),
            _ => None,
        }
    }
}
