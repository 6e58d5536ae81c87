use std::sync::Arc;

use alchemy_schema::{CollectionDraft, FieldDefinition, FieldPatch};
use tokio::sync::watch;

/// A read-only view of the draft at one point in time.
pub type DraftSnapshot = Arc<CollectionDraft>;

/// Single owner of the collection draft.
///
/// Every applied mutation builds a new draft and swaps it in; a snapshot
/// handed out earlier keeps the value it was taken with. Subscribers see
/// each swapped-in snapshot through a `watch` channel.
///
/// Operations never fail. An index past the end of the field list leaves the
/// draft untouched, as does a change that would not alter anything; neither
/// counts as a revision.
pub struct DraftStore {
    sender: watch::Sender<DraftSnapshot>,
    revision: u64,
}

impl DraftStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(CollectionDraft::default()));
        Self {
            sender,
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        Arc::clone(&self.sender.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftSnapshot> {
        self.sender.subscribe()
    }

    /// Number of mutations applied since the store was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.sender.borrow().name == value {
            return;
        }
        self.replace(|draft| draft.name = value);
    }

    pub fn append_field(&mut self) {
        self.replace(|draft| draft.fields.push(FieldDefinition::default()));
    }

    pub fn update_field(&mut self, index: usize, patch: &FieldPatch) {
        let updated = match self.sender.borrow().fields.get(index) {
            Some(field) => {
                let updated = patch.apply(field);
                if updated == *field {
                    return;
                }
                updated
            }
            None => return,
        };
        self.replace(|draft| draft.fields[index] = updated);
    }

    pub fn remove_field(&mut self, index: usize) {
        if index >= self.sender.borrow().fields.len() {
            return;
        }
        self.replace(|draft| {
            draft.fields.remove(index);
        });
    }

    /// Discard the draft and start over with an empty one.
    pub fn reset(&mut self) {
        if **self.sender.borrow() == CollectionDraft::default() {
            return;
        }
        self.replace(|draft| *draft = CollectionDraft::default());
    }

    fn replace(&mut self, mutate: impl FnOnce(&mut CollectionDraft)) {
        let mut next = CollectionDraft::clone(&self.sender.borrow());
        mutate(&mut next);
        self.sender.send_replace(Arc::new(next));
        self.revision += 1;
    }
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}
