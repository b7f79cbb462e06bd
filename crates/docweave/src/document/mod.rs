//! The document controller.
//!
//! A [`Document`] owns the authoritative root and stages local edits on a
//! sandbox clone: the updater closure works against the clone through a
//! proxy, and only when it returns cleanly is the recorded change replayed
//! on the root. A failing updater costs nothing but the clone.
//!
//! Synchronization is a pack exchange: [`Document::create_change_pack`]
//! bundles the buffered local changes, [`Document::apply_change_pack`]
//! consumes the server's response — either remote changes or a full
//! snapshot — trims acknowledged local changes and advances the
//! checkpoint.

pub mod proxy;

pub use proxy::{ArrayProxy, ObjectProxy};

use thiserror::Error;

use crate::change::{
    Change, ChangeContext, ChangeID, Checkpoint, DocKey, Pack, INITIAL_CHANGE_ID,
    INITIAL_CHECKPOINT,
};
use crate::clock::{ActorID, INITIAL_TICKET};
use crate::codec;
use crate::crdt::{Object, Root};

/// Error type updater closures may return; it is propagated verbatim.
pub type UpdaterError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by the document controller.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Decode(#[from] codec::DecodeError),
    #[error("updater failed: {0}")]
    Updater(#[source] UpdaterError),
    #[error(transparent)]
    Apply(#[from] crate::change::ApplyError),
}

/// Whether the document is bound to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    /// No client: tickets are issued with the nil actor.
    Detached,
    /// Attached to a client that assigned the actor.
    Attached,
}

/// A replicated JSON-shaped document.
#[derive(Debug)]
pub struct Document {
    key: DocKey,
    state: DocState,
    root: Root,
    clone: Option<Root>,
    checkpoint: Checkpoint,
    change_id: ChangeID,
    local_changes: Vec<Change>,
}

impl Document {
    /// An empty detached document.
    pub fn new(collection: &str, document: &str) -> Self {
        Self {
            key: DocKey::new(collection, document),
            state: DocState::Detached,
            root: Root::new(Object::new(INITIAL_TICKET)),
            clone: None,
            checkpoint: INITIAL_CHECKPOINT,
            change_id: INITIAL_CHANGE_ID,
            local_changes: Vec::new(),
        }
    }

    /// A document whose root is decoded from a server snapshot taken at
    /// `server_seq`.
    pub fn from_snapshot(
        collection: &str,
        document: &str,
        server_seq: u64,
        snapshot: &[u8],
    ) -> Result<Self, DocumentError> {
        let object = codec::bytes_to_object(snapshot)?;
        Ok(Self {
            key: DocKey::new(collection, document),
            state: DocState::Detached,
            root: Root::new(object),
            clone: None,
            checkpoint: INITIAL_CHECKPOINT.next_server_seq(server_seq),
            change_id: INITIAL_CHANGE_ID,
            local_changes: Vec::new(),
        })
    }

    pub fn key(&self) -> &DocKey {
        &self.key
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn actor(&self) -> ActorID {
        self.change_id.actor
    }

    /// Run `updater` against the document through a proxy over the clone.
    ///
    /// On success any recorded operations become one change: replayed on
    /// the root, appended to the local buffer, and the change id advances.
    /// On updater failure the clone is dropped and the document is exactly
    /// as it was.
    pub fn update<F>(&mut self, message: &str, updater: F) -> Result<(), DocumentError>
    where
        F: FnOnce(&mut ObjectProxy) -> Result<(), UpdaterError>,
    {
        let root = &self.root;
        let clone = self.clone.get_or_insert_with(|| root.deep_copy());

        let mut ctx = ChangeContext::new(self.change_id.next(), message.to_owned());
        let target = clone.object().created_at();
        let mut proxy = ObjectProxy::new(&mut ctx, clone, target);

        if let Err(err) = updater(&mut proxy) {
            // The clone is contaminated by whatever the updater did before
            // failing; the root and the change id never saw any of it.
            self.clone = None;
            tracing::error!(error = %err, "updater failed");
            return Err(DocumentError::Updater(err));
        }

        if ctx.has_operations() {
            let id = ctx.id();
            let change = ctx.into_change();
            change.execute(&mut self.root)?;
            self.local_changes.push(change);
            self.change_id = id;
        }
        Ok(())
    }

    pub fn has_local_changes(&self) -> bool {
        !self.local_changes.is_empty()
    }

    /// Bundle the buffered local changes for the server. The buffer is
    /// kept; it is trimmed when the server acknowledges the changes in a
    /// later [`Document::apply_change_pack`].
    pub fn create_change_pack(&self) -> Pack {
        let checkpoint = self
            .checkpoint
            .increase_client_seq(self.local_changes.len() as u32);
        Pack::new(self.key.clone(), checkpoint, self.local_changes.clone(), None)
    }

    /// Consume a pack from the server.
    pub fn apply_change_pack(&mut self, pack: &Pack) -> Result<(), DocumentError> {
        if let Some(snapshot) = pack.snapshot_bytes() {
            self.apply_snapshot(snapshot, pack.checkpoint.server_seq)?;
        } else {
            self.apply_changes(&pack.changes)?;
        }

        let acked = self
            .local_changes
            .iter()
            .take_while(|change| change.client_seq() <= pack.checkpoint.client_seq)
            .count();
        self.local_changes.drain(..acked);

        self.checkpoint = self.checkpoint.forward(&pack.checkpoint);
        tracing::debug!(
            changes = pack.changes_len(),
            checkpoint = %self.checkpoint,
            "applied change pack"
        );
        Ok(())
    }

    /// Assign the actor to this document, restamping the change id and
    /// every buffered local change.
    pub fn set_actor(&mut self, actor: ActorID) {
        for change in &mut self.local_changes {
            change.set_actor(actor);
        }
        self.change_id = self.change_id.set_actor(actor);
    }

    pub fn update_state(&mut self, state: DocState) {
        self.state = state;
    }

    pub fn is_attached(&self) -> bool {
        self.state == DocState::Attached
    }

    pub fn marshal(&self) -> String {
        self.root.marshal()
    }

    pub fn root_object(&self) -> &Object {
        self.root.object()
    }

    /// Replace the root from a snapshot, replay the still-unacknowledged
    /// local changes on top, and jump the Lamport clock past the server.
    fn apply_snapshot(&mut self, snapshot: &[u8], server_seq: u64) -> Result<(), DocumentError> {
        let object = codec::bytes_to_object(snapshot)?;
        self.root = Root::new(object);
        for change in &self.local_changes {
            change.execute(&mut self.root)?;
        }
        self.change_id = self.change_id.sync_lamport(server_seq);
        // The clone predates the snapshot; a later update re-clones.
        self.clone = None;
        Ok(())
    }

    /// Replay remote changes on the clone first, then on the root,
    /// syncing the Lamport clock per change.
    fn apply_changes(&mut self, changes: &[Change]) -> Result<(), DocumentError> {
        let root = &self.root;
        let clone = self.clone.get_or_insert_with(|| root.deep_copy());
        for change in changes {
            change.execute(clone)?;
        }
        for change in changes {
            change.execute(&mut self.root)?;
            self.change_id = self.change_id.sync_lamport(change.id().lamport);
        }
        Ok(())
    }
}
