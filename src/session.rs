//! Selection and edit state.
//!
//! The session never keeps its own copy of a stored note: it holds the
//! selected id and reads the live note from the repository whenever a view
//! is needed. Editing works on a [`Draft`] that is merged into the
//! repository only on save. A draft for a brand-new note carries the
//! allocated note itself, so cancelling it leaves nothing behind.

use log::{debug, info};

use crate::{normalize_title, KeyValueBackend, Note, NoteRepository, NoteUpdate};

/// What a draft will be written into on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftTarget {
    /// A note already in the repository.
    Existing(String),
    /// A note allocated by [`EditSession::create`] that has never been saved.
    New(Note),
}

/// Unsaved title and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    target: DraftTarget,
}

impl Draft {
    pub fn note_id(&self) -> &str {
        match &self.target {
            DraftTarget::Existing(id) => id,
            DraftTarget::New(note) => &note.id,
        }
    }

    pub fn target(&self) -> &DraftTarget {
        &self.target
    }

    /// True while the draft's note has no repository entry yet.
    pub fn is_new(&self) -> bool {
        matches!(self.target, DraftTarget::New(_))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

/// Borrowed view of where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    Idle,
    Viewing(&'a str),
    Editing(&'a Draft),
}

/// Selection plus an optional open draft. `viewing` and `draft` are never
/// both set; an open draft is itself the selection.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    viewing: Option<String>,
    draft: Option<Draft>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState<'_> {
        match (&self.draft, &self.viewing) {
            (Some(draft), _) => SessionState::Editing(draft),
            (None, Some(id)) => SessionState::Viewing(id),
            (None, None) => SessionState::Idle,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        match self.state() {
            SessionState::Idle => None,
            SessionState::Viewing(id) => Some(id),
            SessionState::Editing(draft) => Some(draft.note_id()),
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_id() == Some(id)
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn is_creating(&self) -> bool {
        self.draft().is_some_and(Draft::is_new)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    fn go_idle(&mut self) {
        self.viewing = None;
        self.draft = None;
    }

    fn view(&mut self, id: String) {
        self.draft = None;
        self.viewing = Some(id);
    }

    fn open_draft(&mut self, draft: Draft) -> &mut Draft {
        self.viewing = None;
        self.draft.insert(draft)
    }

    /// The never-saved note of an open create draft.
    pub fn pending_note(&self) -> Option<&Note> {
        match self.draft().map(Draft::target) {
            Some(DraftTarget::New(note)) => Some(note),
            _ => None,
        }
    }

    /// Live view of the selected note.
    pub fn current<B: KeyValueBackend>(&self, repo: &NoteRepository<B>) -> Option<Note> {
        if let Some(note) = self.pending_note() {
            return Some(note.clone());
        }
        self.selected_id().and_then(|id| repo.get(id)).cloned()
    }

    /// Selects a stored note. Any open draft is dropped without saving.
    pub fn select<B: KeyValueBackend>(&mut self, repo: &NoteRepository<B>, id: &str) -> bool {
        if !repo.contains(id) {
            debug!("Cannot select unknown note: {}", id);
            return false;
        }
        if let Some(draft) = self.draft() {
            debug!("Discarding unsaved draft for note {}", draft.note_id());
        }
        self.view(id.to_string());
        true
    }

    /// Opens a draft for a new note. The note reaches the repository on save.
    pub fn create<B: KeyValueBackend>(&mut self, repo: &NoteRepository<B>) -> &mut Draft {
        let note = repo.allocate();
        info!("Opened draft for new note: {}", note.id);
        let draft = Draft {
            title: note.title.clone(),
            content: note.content.clone(),
            target: DraftTarget::New(note),
        };
        self.open_draft(draft)
    }

    /// Selects the note with `id` and opens a draft seeded from its stored
    /// title and content.
    pub fn edit<B: KeyValueBackend>(&mut self, repo: &NoteRepository<B>, id: &str) -> bool {
        let Some(note) = repo.get(id) else {
            debug!("Cannot edit unknown note: {}", id);
            return false;
        };
        let draft = Draft {
            title: note.title.clone(),
            content: note.content.clone(),
            target: DraftTarget::Existing(note.id.clone()),
        };
        self.open_draft(draft);
        true
    }

    /// Opens a draft for the note currently being viewed.
    pub fn edit_selected<B: KeyValueBackend>(&mut self, repo: &NoteRepository<B>) -> bool {
        if self.draft.is_some() {
            return false;
        }
        match self.viewing.clone() {
            Some(id) => self.edit(repo, &id),
            None => false,
        }
    }

    /// Commits the open draft and returns to viewing the saved note.
    pub fn save<B: KeyValueBackend>(&mut self, repo: &mut NoteRepository<B>) -> Option<Note> {
        let Some(draft) = self.draft.take() else {
            debug!("Save requested with no open draft");
            return None;
        };
        let title = normalize_title(&draft.title);

        let saved = match draft.target {
            DraftTarget::Existing(id) => {
                let saved = repo.update(&id, NoteUpdate::text(title, draft.content));
                if saved.is_none() {
                    debug!("Note {} vanished before save, dropping draft", id);
                }
                saved
            }
            DraftTarget::New(mut note) => {
                NoteUpdate::text(title, draft.content).apply(&mut note);
                match repo.insert(note) {
                    Ok(note) => Some(note),
                    Err(e) => {
                        debug!("Failed to insert new note: {}", e);
                        None
                    }
                }
            }
        };

        if let Some(note) = &saved {
            self.view(note.id.clone());
        }
        saved
    }

    /// Discards the open draft. A new note is dropped entirely and the
    /// session goes idle; an existing note goes back to being viewed.
    pub fn cancel<B: KeyValueBackend>(&mut self, repo: &NoteRepository<B>) {
        let Some(draft) = self.draft.take() else {
            return;
        };
        match draft.target {
            DraftTarget::New(note) => {
                info!("Discarded never-saved note: {}", note.id);
                self.go_idle();
            }
            DraftTarget::Existing(id) if repo.contains(&id) => self.view(id),
            DraftTarget::Existing(_) => self.go_idle(),
        }
    }

    /// Flips completion of `id` without leaving the current state.
    pub fn toggle<B: KeyValueBackend>(
        &mut self,
        repo: &mut NoteRepository<B>,
        id: &str,
    ) -> Option<Note> {
        if let Some(Draft {
            target: DraftTarget::New(note),
            ..
        }) = &mut self.draft
        {
            if note.id == id {
                NoteUpdate::completed(!note.completed).apply(note);
                return Some(note.clone());
            }
        }
        repo.toggle(id)
    }

    /// Deletes `id`; if it was selected the session goes idle.
    pub fn delete<B: KeyValueBackend>(&mut self, repo: &mut NoteRepository<B>, id: &str) -> bool {
        if self.pending_note().is_some_and(|note| note.id == id) {
            self.go_idle();
            info!("Discarded never-saved note: {}", id);
            return true;
        }
        let removed = repo.delete(id);
        self.forget(id);
        removed
    }

    /// Goes idle if `id` is the selected note.
    pub fn forget(&mut self, id: &str) {
        if self.is_selected(id) {
            debug!("Clearing selection of note {}", id);
            self.go_idle();
        }
    }

    /// Goes idle if the selected stored note no longer exists.
    pub fn reconcile<B: KeyValueBackend>(&mut self, repo: &NoteRepository<B>) {
        if self.pending_note().is_some() {
            return;
        }
        if let Some(id) = self.selected_id() {
            if !repo.contains(id) {
                let id = id.to_string();
                self.forget(&id);
            }
        }
    }
}
