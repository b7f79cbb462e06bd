//! [`Pack`] — the unit of synchronization with the server, and the
//! document key it belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::change::checkpoint::Checkpoint;
use crate::change::Change;

/// Identifies a document within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocKey {
    pub collection: String,
    pub document: String,
}

impl DocKey {
    pub fn new(collection: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.collection, self.document)
    }
}

/// A batch exchanged with the server: either a list of changes or a full
/// snapshot. When a non-empty snapshot is present the changes are ignored
/// on apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pack {
    pub document_key: DocKey,
    pub checkpoint: Checkpoint,
    pub changes: Vec<Change>,
    pub snapshot: Option<Vec<u8>>,
}

impl Pack {
    pub fn new(
        document_key: DocKey,
        checkpoint: Checkpoint,
        changes: Vec<Change>,
        snapshot: Option<Vec<u8>>,
    ) -> Self {
        Self {
            document_key,
            checkpoint,
            changes,
            snapshot,
        }
    }

    /// The snapshot payload, if one is present and non-empty.
    pub fn snapshot_bytes(&self) -> Option<&[u8]> {
        self.snapshot.as_deref().filter(|bytes| !bytes.is_empty())
    }

    pub fn changes_len(&self) -> usize {
        self.changes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::checkpoint::INITIAL_CHECKPOINT;

    #[test]
    fn doc_key_display() {
        assert_eq!(DocKey::new("notes", "today").to_string(), "notes$today");
    }

    #[test]
    fn empty_snapshot_counts_as_absent() {
        let key = DocKey::new("c", "d");
        let none = Pack::new(key.clone(), INITIAL_CHECKPOINT, Vec::new(), None);
        let empty = Pack::new(key.clone(), INITIAL_CHECKPOINT, Vec::new(), Some(Vec::new()));
        let some = Pack::new(key, INITIAL_CHECKPOINT, Vec::new(), Some(vec![1, 2]));
        assert!(none.snapshot_bytes().is_none());
        assert!(empty.snapshot_bytes().is_none());
        assert_eq!(some.snapshot_bytes(), Some(&[1u8, 2][..]));
    }
}
