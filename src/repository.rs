//! In-memory note collection with write-through persistence.
//!
//! The repository owns the authoritative, ordered note list for the session.
//! Every mutation is followed by a full re-serialization of the list to its
//! [`NoteStore`]. A failed write never rolls back the in-memory change: the
//! error is logged, the repository is marked dirty, and the next successful
//! write brings the store back in line.

use std::collections::HashSet;

use log::{debug, error, info, trace};

use crate::{
    generate_note_id, KeyValueBackend, Note, NoteStore, NoteUpdate, NotepadError, Result,
};

pub struct NoteRepository<B> {
    /// Most recently created first
    notes: Vec<Note>,
    store: NoteStore<B>,
    /// Set when the last write-through failed
    dirty: bool,
}

impl<B: KeyValueBackend> NoteRepository<B> {
    /// Loads the persisted list from `store`.
    pub fn load(store: NoteStore<B>) -> Self {
        let mut notes = store.load();

        let before = notes.len();
        let mut seen = HashSet::with_capacity(before);
        notes.retain(|note| seen.insert(note.id.clone()));
        if notes.len() != before {
            debug!(
                "Dropped {} stored notes with duplicate ids",
                before - notes.len()
            );
        }

        Self {
            notes,
            store,
            dirty: false,
        }
    }

    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether the in-memory list has changes the store has not accepted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &NoteStore<B> {
        &self.store
    }

    /// Builds a note with a fresh id and default fields, without inserting it.
    pub fn allocate(&self) -> Note {
        let mut id = generate_note_id();
        while self.contains(&id) {
            id = generate_note_id();
        }
        Note::new(id)
    }

    /// Creates a default note at the front of the list.
    pub fn create(&mut self) -> Note {
        let note = self.allocate();
        info!("Creating note: {}", note.id);
        self.notes.insert(0, note.clone());
        self.persist();
        note
    }

    /// Prepends a note built with [`allocate`](Self::allocate).
    pub fn insert(&mut self, note: Note) -> Result<Note> {
        if self.contains(&note.id) {
            error!("Cannot insert note {}: id already present", note.id);
            return Err(NotepadError::NoteAlreadyExists { id: note.id });
        }
        info!("Inserting note: {}", note.id);
        self.notes.insert(0, note.clone());
        self.persist();
        Ok(note)
    }

    /// Applies `update` to the note with `id`, keeping its position.
    ///
    /// An unknown id is a no-op and returns `None`.
    pub fn update(&mut self, id: &str, update: NoteUpdate) -> Option<Note> {
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            debug!("Ignoring update for unknown note: {}", id);
            return None;
        };
        update.apply(note);
        let updated = note.clone();
        info!("Updated note: {}", id);
        self.persist();
        Some(updated)
    }

    /// Flips the completion flag of the note with `id`.
    pub fn toggle(&mut self, id: &str) -> Option<Note> {
        let completed = self.get(id)?.completed;
        self.update(id, NoteUpdate::completed(!completed))
    }

    /// Removes the note with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        if self.notes.len() == before {
            debug!("Ignoring delete for unknown note: {}", id);
            return false;
        }
        info!("Deleted note: {}", id);
        self.persist();
        true
    }

    /// Retries the write of the current list.
    pub fn flush(&mut self) -> Result<()> {
        self.store.save(&self.notes)?;
        self.dirty = false;
        Ok(())
    }

    fn persist(&mut self) {
        match self.store.save(&self.notes) {
            Ok(()) => {
                trace!("Persisted {} notes", self.notes.len());
                self.dirty = false;
            }
            Err(e) => {
                error!(
                    "Failed to persist notes, continuing with in-memory state: {}",
                    e
                );
                self.dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    /// Backend whose writes can be switched off.
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_writes: bool,
    }

    impl KeyValueBackend for FlakyBackend {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                return Err(NotepadError::ApplicationError {
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.set(key, value)
        }
    }

    fn repo() -> NoteRepository<MemoryBackend> {
        NoteRepository::load(NoteStore::new(MemoryBackend::new()))
    }

    fn stored(repo: &NoteRepository<MemoryBackend>) -> Vec<Note> {
        NoteStore::new(repo.store().backend().clone()).load()
    }

    #[test]
    fn test_create_prepends_and_persists() {
        let mut repo = repo();
        let first = repo.create();
        let second = repo.create();

        assert_eq!(repo.list()[0].id, second.id);
        assert_eq!(repo.list()[1].id, first.id);
        assert_eq!(stored(&repo), repo.list());
    }

    #[test]
    fn test_update_keeps_order_and_restamps() {
        let mut repo = repo();
        let older = repo.create();
        let newer = repo.create();

        let updated = repo
            .update(&older.id, NoteUpdate::text("Edited", "body"))
            .unwrap();

        assert_eq!(updated.title, "Edited");
        assert!(updated.updated_at >= older.updated_at);
        assert_eq!(updated.created_at, older.created_at);
        let ids: Vec<_> = repo.list().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(stored(&repo)[1].title, "Edited");
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let mut repo = repo();
        repo.create();
        let snapshot = repo.list().to_vec();

        assert!(repo.update("missing", NoteUpdate::text("x", "y")).is_none());
        assert!(repo.toggle("missing").is_none());
        assert!(!repo.delete("missing"));
        assert_eq!(repo.list(), snapshot.as_slice());
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        let mut repo = repo();
        let note = repo.create();

        let once = repo.toggle(&note.id).unwrap();
        assert!(once.completed);
        assert!(once.updated_at >= note.updated_at);

        let twice = repo.toggle(&note.id).unwrap();
        assert!(!twice.completed);
        assert!(twice.updated_at >= once.updated_at);
    }

    #[test]
    fn test_delete_removes_and_persists() {
        let mut repo = repo();
        let note = repo.create();
        assert!(repo.delete(&note.id));
        assert!(repo.is_empty());
        assert!(stored(&repo).is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut repo = repo();
        let note = repo.create();
        assert!(matches!(
            repo.insert(note),
            Err(NotepadError::NoteAlreadyExists { .. })
        ));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_allocate_does_not_insert() {
        let repo = repo();
        let note = repo.allocate();
        assert!(!repo.contains(&note.id));
    }

    #[test]
    fn test_failed_write_keeps_memory_state_and_recovers() {
        let mut repo = NoteRepository::load(NoteStore::new(FlakyBackend::default()));
        repo.store.backend_mut().fail_writes = true;

        let note = repo.create();
        assert!(repo.is_dirty());
        assert_eq!(repo.list()[0].id, note.id);
        assert!(repo.store().load().is_empty());

        repo.store.backend_mut().fail_writes = false;
        repo.flush().unwrap();
        assert!(!repo.is_dirty());
        assert_eq!(repo.store().load().len(), 1);
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let mut store = NoteStore::new(MemoryBackend::new());
        let note = Note::new("42".to_string());
        store.save(&[note.clone(), note]).unwrap();

        let repo = NoteRepository::load(store);
        assert_eq!(repo.len(), 1);
    }
}
