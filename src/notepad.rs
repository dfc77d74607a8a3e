//! The single object a front end drives.
//!
//! `Notepad` owns the repository, the edit session and the current search
//! term, and routes every user action through them so the session is always
//! reconciled with the repository after a mutation.

use log::info;

use crate::{
    filter_notes, Draft, EditSession, KeyValueBackend, Note, NoteRepository, NoteStore, Result,
};

pub struct Notepad<B> {
    repo: NoteRepository<B>,
    session: EditSession,
    search_term: String,
}

impl<B: KeyValueBackend> Notepad<B> {
    /// Loads the saved notes and starts with nothing selected.
    pub fn open(store: NoteStore<B>) -> Self {
        let repo = NoteRepository::load(store);
        info!("Notepad opened with {} notes", repo.len());
        Self {
            repo,
            session: EditSession::new(),
            search_term: String::new(),
        }
    }

    pub fn repository(&self) -> &NoteRepository<B> {
        &self.repo
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn notes(&self) -> &[Note] {
        self.repo.list()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Notes to show in the list: the note being created (if any) first,
    /// then the stored notes, all narrowed by the search term.
    pub fn visible_notes(&self) -> Vec<&Note> {
        let pending = self
            .session
            .pending_note()
            .map(std::slice::from_ref)
            .unwrap_or_default();
        let mut visible = filter_notes(pending, &self.search_term);
        visible.extend(filter_notes(self.repo.list(), &self.search_term));
        visible
    }

    /// The note shown in the detail pane.
    pub fn selected(&self) -> Option<Note> {
        self.session.current(&self.repo)
    }

    pub fn create_note(&mut self) -> &mut Draft {
        self.session.create(&self.repo)
    }

    pub fn select_note(&mut self, id: &str) -> bool {
        self.session.select(&self.repo, id)
    }

    pub fn edit_note(&mut self, id: &str) -> bool {
        self.session.edit(&self.repo, id)
    }

    pub fn edit_selected(&mut self) -> bool {
        self.session.edit_selected(&self.repo)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.session.draft()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.session.draft_mut()
    }

    pub fn save(&mut self) -> Option<Note> {
        self.session.save(&mut self.repo)
    }

    pub fn cancel(&mut self) {
        self.session.cancel(&self.repo)
    }

    pub fn toggle(&mut self, id: &str) -> Option<Note> {
        self.session.toggle(&mut self.repo, id)
    }

    pub fn delete_note(&mut self, id: &str) -> bool {
        let removed = self.session.delete(&mut self.repo, id);
        self.session.reconcile(&self.repo);
        removed
    }

    pub fn is_dirty(&self) -> bool {
        self.repo.is_dirty()
    }

    /// Rewrites the store from memory; call before shutting down.
    pub fn flush(&mut self) -> Result<()> {
        self.repo.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    fn notepad() -> Notepad<MemoryBackend> {
        Notepad::open(NoteStore::new(MemoryBackend::new()))
    }

    #[test]
    fn test_pending_note_listed_first_while_creating() {
        let mut pad = notepad();
        pad.create_note().set_title("Saved");
        let saved = pad.save().unwrap();

        let pending_id = pad.create_note().note_id().to_string();

        let visible: Vec<_> = pad.visible_notes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(visible, vec![pending_id, saved.id]);
        assert_eq!(pad.notes().len(), 1);
    }

    #[test]
    fn test_search_term_narrows_visible_notes() {
        let mut pad = notepad();
        let draft = pad.create_note();
        draft.set_title("Groceries");
        draft.set_content("milk");
        pad.save();
        pad.create_note().set_title("Todo");
        pad.save();

        pad.set_search_term("MILK");
        let visible = pad.visible_notes();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Groceries");
    }

    #[test]
    fn test_delete_selected_clears_detail() {
        let mut pad = notepad();
        pad.create_note();
        let note = pad.save().unwrap();
        assert_eq!(pad.selected().unwrap().id, note.id);

        assert!(pad.delete_note(&note.id));
        assert!(pad.selected().is_none());
        assert!(!pad.session().is_editing());
    }
}
