//! CLI module for the notepad application
//!
//! This module turns parsed commands and shell input into calls on a
//! [`Notepad`] and renders the results as text or JSON.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, BufRead, Write},
    path::{Path, PathBuf},
    process::Command,
};

use log::{info, warn};
use shell_words::split;
use tempfile::Builder;

use crate::{
    content_preview, filter_notes, format_timestamp, fuzzy_search, Commands, Config,
    KeyValueBackend, Note, Notepad, NotepadError, Result, SessionState, DEFAULT_TITLE,
};

const SHELL_HELP: &str = "\
Commands:
  list                 show notes (filtered by the current search)
  search [TEXT]        set the search text; no text clears it
  select ID            view a note
  show                 print the selected note
  new                  start a new note
  edit [ID]            edit a note (default: the selected one)
  title TEXT           set the draft title
  content TEXT         replace the draft content
  append TEXT          add a line to the draft content
  save                 save the draft
  cancel               discard the draft
  toggle [ID]          flip completion (default: the selected note)
  delete [ID]          delete a note (default: the selected one)
  help                 show this help
  quit                 leave the shell";

/// CLI Application handler - processes commands against a [`Notepad`]
pub struct App<B, W> {
    notepad: Notepad<B>,

    /// Application configuration
    config: Config,

    /// Where `config --reset` writes to
    config_path: Option<PathBuf>,

    /// Destination of everything the commands print
    out: W,
}

impl<B: KeyValueBackend, W: Write> App<B, W> {
    pub fn new(notepad: Notepad<B>, config: Config, config_path: Option<PathBuf>, out: W) -> Self {
        Self {
            notepad,
            config,
            config_path,
            out,
        }
    }

    pub fn notepad(&self) -> &Notepad<B> {
        &self.notepad
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::New {
                title,
                content,
                edit,
            } => self.create_note(title, content, edit)?,

            Commands::List {
                search,
                limit,
                json,
                brief,
            } => self.list_notes(search, limit, json, brief)?,

            Commands::View { id, json } => self.view_note(&id, json)?,

            Commands::Edit {
                id,
                title,
                content,
                edit,
            } => self.handle_edit(&id, title, content, edit)?,

            Commands::Toggle { id } => self.handle_toggle(&id)?,

            Commands::Delete { id, force } => self.handle_delete(&id, force)?,

            Commands::Search {
                term,
                fuzzy,
                limit,
                json,
            } => self.handle_search(&term, fuzzy, limit, json)?,

            Commands::Shell => {
                let stdin = stdin();
                self.run_shell(stdin.lock())?
            }

            Commands::Config { show, reset } => self.handle_config(show, reset)?,
        }

        self.ensure_persisted()
    }

    /// A one-shot command must not exit with changes only held in memory.
    fn ensure_persisted(&mut self) -> Result<()> {
        if !self.notepad.is_dirty() {
            return Ok(());
        }
        warn!("Last write failed, retrying before exit");
        self.notepad.flush().map_err(|e| NotepadError::ApplicationError {
            message: format!("Changes could not be saved: {}", e),
        })
    }

    fn create_note(
        &mut self,
        title: Option<String>,
        content: Option<String>,
        open_editor: bool,
    ) -> Result<()> {
        let content = if open_editor {
            let heading = title.as_deref().unwrap_or(DEFAULT_TITLE);
            self.open_editor_with_content(heading, content.as_deref().unwrap_or(""))?
        } else {
            content.unwrap_or_default()
        };

        let draft = self.notepad.create_note();
        if let Some(title) = title {
            draft.set_title(title);
        }
        draft.set_content(content);

        let note = self
            .notepad
            .save()
            .ok_or_else(|| NotepadError::ApplicationError {
                message: "Failed to save the new note".to_string(),
            })?;

        writeln!(self.out, "Note created with ID: {}", note.id)?;
        Ok(())
    }

    fn list_notes(
        &mut self,
        search: Option<String>,
        limit: Option<usize>,
        json: bool,
        brief: bool,
    ) -> Result<()> {
        self.notepad.set_search_term(search.unwrap_or_default());
        let mut notes = self.notepad.visible_notes();
        truncate(&mut notes, limit);

        if json {
            write_notes_json(&mut self.out, &notes, !brief)?;
        } else if notes.is_empty() {
            if self.notepad.search_term().is_empty() {
                writeln!(self.out, "No notes yet. Create your first note!")?;
            } else {
                writeln!(self.out, "No notes found")?;
            }
        } else {
            write_notes_text(&mut self.out, &notes, None, brief)?;
            writeln!(
                self.out,
                "\nFound {} note{}",
                notes.len(),
                if notes.len() == 1 { "" } else { "s" }
            )?;
        }
        Ok(())
    }

    fn view_note(&mut self, id: &str, json: bool) -> Result<()> {
        if !self.notepad.select_note(id) {
            return Err(NotepadError::NoteNotFound { id: id.to_string() });
        }
        let note = self
            .notepad
            .selected()
            .ok_or_else(|| NotepadError::NoteNotFound { id: id.to_string() })?;

        if json {
            writeln!(self.out, "{}", serde_json::to_string_pretty(&note)?)?;
        } else {
            write_note_detail(&mut self.out, &note)?;
        }
        Ok(())
    }

    fn handle_edit(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        open_editor: bool,
    ) -> Result<()> {
        if content.is_some() && open_editor {
            return Err(NotepadError::ApplicationError {
                message: "Cannot specify both --content and --edit options".to_string(),
            });
        }
        if title.is_none() && content.is_none() && !open_editor {
            return Err(NotepadError::ApplicationError {
                message: "Nothing to change: pass --title, --content or --edit".to_string(),
            });
        }

        if !self.notepad.edit_note(id) {
            return Err(NotepadError::NoteNotFound { id: id.to_string() });
        }

        let content = if open_editor {
            let (heading, current) = match self.notepad.draft() {
                Some(draft) => (
                    title.clone().unwrap_or_else(|| draft.title.clone()),
                    draft.content.clone(),
                ),
                None => (String::new(), String::new()),
            };
            match self.open_editor_with_content(&heading, &current) {
                Ok(content) => Some(content),
                Err(e) => {
                    self.notepad.cancel();
                    return Err(e);
                }
            }
        } else {
            content
        };

        if let Some(draft) = self.notepad.draft_mut() {
            if let Some(title) = title {
                draft.set_title(title);
            }
            if let Some(content) = content {
                draft.set_content(content);
            }
        }

        let note = self
            .notepad
            .save()
            .ok_or_else(|| NotepadError::NoteNotFound { id: id.to_string() })?;

        writeln!(self.out, "Note {} updated successfully", note.id)?;
        Ok(())
    }

    fn handle_toggle(&mut self, id: &str) -> Result<()> {
        let note = self
            .notepad
            .toggle(id)
            .ok_or_else(|| NotepadError::NoteNotFound { id: id.to_string() })?;
        writeln!(
            self.out,
            "Note {} marked {}",
            note.id,
            if note.completed { "completed" } else { "open" }
        )?;
        Ok(())
    }

    fn handle_delete(&mut self, id: &str, force: bool) -> Result<()> {
        let note = match self.notepad.repository().get(id) {
            Some(note) => note.clone(),
            None => return Err(NotepadError::NoteNotFound { id: id.to_string() }),
        };

        if !force {
            writeln!(self.out, "You are about to delete the following note:")?;
            writeln!(self.out, "ID:      {}", note.id)?;
            writeln!(self.out, "Title:   {}", note.title)?;
            writeln!(self.out, "Updated: {}", format_timestamp(&note.updated_at))?;
            write!(self.out, "\nAre you sure you want to delete this note? [y/N]: ")?;
            self.out.flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;
            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                writeln!(self.out, "Deletion cancelled.")?;
                return Ok(());
            }
        }

        self.notepad.delete_note(id);
        writeln!(
            self.out,
            "Note '{}' ({}) has been permanently deleted.",
            note.title, note.id
        )?;
        Ok(())
    }

    fn handle_search(
        &mut self,
        term: &str,
        fuzzy: bool,
        limit: Option<usize>,
        json: bool,
    ) -> Result<()> {
        let notes = self.notepad.notes();
        let mut results = if fuzzy {
            fuzzy_search(notes, term)
        } else {
            filter_notes(notes, term)
        };
        let total = results.len();
        truncate(&mut results, limit);

        if json {
            write_notes_json(&mut self.out, &results, true)?;
            return Ok(());
        }

        if results.is_empty() {
            writeln!(self.out, "No notes found matching query: \"{}\"", term)?;
            return Ok(());
        }

        write_notes_text(&mut self.out, &results, None, false)?;
        if results.len() < total {
            writeln!(
                self.out,
                "\nShowing {} of {} matching notes. Use --limit to show more.",
                results.len(),
                total
            )?;
        } else {
            writeln!(self.out, "\nFound {} matching notes.", total)?;
        }
        Ok(())
    }

    fn handle_config(&mut self, show: bool, reset: bool) -> Result<()> {
        if reset {
            let path = self
                .config_path
                .clone()
                .or_else(Config::default_path)
                .ok_or_else(|| NotepadError::ConfigError {
                    message: "No configuration path available".to_string(),
                })?;
            self.config = Config::default();
            self.config.save(&path)?;
            writeln!(self.out, "Configuration reset: {}", path.display())?;
        }

        if show || !reset {
            writeln!(self.out, "{}", serde_json::to_string_pretty(&self.config)?)?;
        }
        Ok(())
    }

    /// Reads shell commands from `input` until `quit` or end of input.
    pub fn run_shell<R: BufRead>(&mut self, mut input: R) -> Result<()> {
        info!("Starting interactive shell");
        writeln!(self.out, "Type 'help' for commands.")?;

        let mut line = String::new();
        loop {
            let prompt = self.prompt();
            write!(self.out, "{}> ", prompt)?;
            self.out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                break;
            }

            let words = match split(line.trim()) {
                Ok(words) => words,
                Err(e) => {
                    writeln!(self.out, "Could not parse input: {}", e)?;
                    continue;
                }
            };
            let Some((command, args)) = words.split_first() else {
                continue;
            };

            if matches!(command.as_str(), "quit" | "exit" | "q") {
                break;
            }
            self.shell_command(command, args)?;
        }

        if self.notepad.session().is_editing() {
            writeln!(self.out, "Unsaved draft discarded.")?;
        }
        if self.notepad.is_dirty() {
            if let Err(e) = self.notepad.flush() {
                warn!("Failed to save notes on exit: {}", e);
                writeln!(self.out, "Warning: notes could not be saved: {}", e)?;
            }
        }
        info!("Shell closed");
        Ok(())
    }

    fn prompt(&self) -> String {
        match self.notepad.session().state() {
            SessionState::Idle => "notepad".to_string(),
            SessionState::Viewing(id) => format!("notepad:{}", id),
            SessionState::Editing(draft) if draft.is_new() => "notepad:new*".to_string(),
            SessionState::Editing(draft) => format!("notepad:{}*", draft.note_id()),
        }
    }

    fn shell_command(&mut self, command: &str, args: &[String]) -> Result<()> {
        let text = args.join(" ");
        let target = args
            .first()
            .cloned()
            .or_else(|| self.notepad.session().selected_id().map(str::to_string));

        match command {
            "help" | "?" => writeln!(self.out, "{}", SHELL_HELP)?,

            "list" | "ls" => self.shell_list()?,

            "search" => {
                self.notepad.set_search_term(text);
                self.shell_list()?;
            }

            "select" | "open" => match args.first() {
                Some(id) => {
                    if self.notepad.select_note(id) {
                        self.shell_show()?;
                    } else {
                        writeln!(self.out, "No note with ID {}", id)?;
                    }
                }
                None => writeln!(self.out, "Usage: select ID")?,
            },

            "show" => self.shell_show()?,

            "new" => {
                let id = self.notepad.create_note().note_id().to_string();
                writeln!(self.out, "Editing new note {}", id)?;
            }

            "edit" => {
                let opened = match args.first() {
                    Some(id) => self.notepad.edit_note(id),
                    None => self.notepad.edit_selected(),
                };
                if opened {
                    self.shell_draft()?;
                } else {
                    writeln!(self.out, "Select a note to edit first")?;
                }
            }

            "title" | "content" | "append" => {
                let changed = match self.notepad.draft_mut() {
                    Some(draft) => {
                        match command {
                            "title" => draft.set_title(text),
                            "content" => draft.set_content(text),
                            _ => {
                                if !draft.content.is_empty() {
                                    draft.content.push('\n');
                                }
                                draft.content.push_str(&text);
                            }
                        }
                        true
                    }
                    None => false,
                };
                if changed {
                    self.shell_draft()?;
                } else {
                    writeln!(self.out, "Not editing; use 'new' or 'edit' first")?;
                }
            }

            "save" => match self.notepad.save() {
                Some(note) => writeln!(self.out, "Saved {} ({})", note.title, note.id)?,
                None => writeln!(self.out, "Nothing to save")?,
            },

            "cancel" => {
                let was_editing = self.notepad.session().is_editing();
                self.notepad.cancel();
                if was_editing {
                    writeln!(self.out, "Draft discarded")?;
                }
            }

            "toggle" => match target.and_then(|id| self.notepad.toggle(&id)) {
                Some(note) => writeln!(
                    self.out,
                    "{} {}",
                    completion_mark(note.completed),
                    note.title
                )?,
                None => writeln!(self.out, "Select a note to toggle first")?,
            },

            "delete" | "rm" => match target {
                Some(id) => {
                    if self.notepad.delete_note(&id) {
                        writeln!(self.out, "Deleted {}", id)?;
                    } else {
                        writeln!(self.out, "No note with ID {}", id)?;
                    }
                }
                None => writeln!(self.out, "Select a note to delete first")?,
            },

            other => writeln!(self.out, "Unknown command '{}'; try 'help'", other)?,
        }

        if self.notepad.is_dirty() {
            writeln!(self.out, "Warning: last change could not be saved")?;
        }
        Ok(())
    }

    fn shell_list(&mut self) -> Result<()> {
        let notes = self.notepad.visible_notes();
        if notes.is_empty() {
            if self.notepad.search_term().is_empty() {
                writeln!(self.out, "No notes yet. Create your first note!")?;
            } else {
                writeln!(self.out, "No notes found")?;
            }
            return Ok(());
        }
        let selected = self.notepad.session().selected_id();
        write_notes_text(&mut self.out, &notes, selected, true)
    }

    fn shell_show(&mut self) -> Result<()> {
        if self.notepad.session().is_editing() {
            return self.shell_draft();
        }
        match self.notepad.selected() {
            Some(note) => write_note_detail(&mut self.out, &note),
            None => {
                writeln!(self.out, "Select a note to view")?;
                Ok(())
            }
        }
    }

    fn shell_draft(&mut self) -> Result<()> {
        if let Some(draft) = self.notepad.draft() {
            writeln!(
                self.out,
                "{} note",
                if draft.is_new() { "New" } else { "Edit" }
            )?;
            writeln!(self.out, "Title:   {}", draft.title)?;
            writeln!(self.out, "Content: {}", draft.content)?;
        }
        Ok(())
    }

    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut file = OpenOptions::new().write(true).open(&temp_path)?;
            writeln!(file, "<!-- {} -->", title)?;
            writeln!(file, "<!-- Write the note content below. Save and exit when done. -->")?;
            write!(file, "{}", existing_content)?;
        }

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor '{}' for note content", editor_cmd);
        launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_editor_comments(&content))
    }
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split(editor_cmd).map_err(|e| NotepadError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(NotepadError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program)
        .args(rest)
        .arg(file_path)
        .status()
        .map_err(|e| NotepadError::EditorError {
            message: format!("Failed to execute editor command: {}", e),
        })?;

    if !status.success() {
        return Err(NotepadError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }
    Ok(())
}

/// Drops the `<!-- ... -->` lines written as an editor header.
fn strip_editor_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let line = line.trim();
            !(line.starts_with("<!--") && line.ends_with("-->"))
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

fn truncate(notes: &mut Vec<&Note>, limit: Option<usize>) {
    if let Some(limit) = limit {
        notes.truncate(limit);
    }
}

fn completion_mark(completed: bool) -> &'static str {
    if completed {
        "[x]"
    } else {
        "[ ]"
    }
}

fn write_notes_json<W: Write>(out: &mut W, notes: &[&Note], detailed: bool) -> Result<()> {
    if detailed {
        writeln!(out, "{}", serde_json::to_string_pretty(notes)?)?;
    } else {
        let brief: Vec<serde_json::Value> = notes
            .iter()
            .map(|note| {
                serde_json::json!({
                    "id": note.id,
                    "title": note.title,
                    "completed": note.completed,
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&brief)?)?;
    }
    Ok(())
}

fn write_notes_text<W: Write>(
    out: &mut W,
    notes: &[&Note],
    selected: Option<&str>,
    brief: bool,
) -> Result<()> {
    let term_width = terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80);

    for (i, note) in notes.iter().enumerate() {
        let cursor = if selected == Some(note.id.as_str()) {
            ">"
        } else {
            " "
        };
        let title = if note.completed {
            console::style(&note.title).bold().strikethrough()
        } else {
            console::style(&note.title).bold()
        };

        if brief {
            writeln!(
                out,
                "{}{} {}  {}",
                cursor,
                completion_mark(note.completed),
                note.id,
                title
            )?;
            continue;
        }

        if i > 0 {
            writeln!(out, "{}", "-".repeat(term_width.min(50)))?;
        }
        writeln!(
            out,
            "{}{} {}  {}",
            cursor,
            completion_mark(note.completed),
            title,
            console::style(format_timestamp(&note.updated_at)).dim()
        )?;
        writeln!(out, "    ID: {}", note.id)?;
        let preview = content_preview(&note.content, 100);
        if preview.is_empty() {
            writeln!(out, "    {}", console::style("No content").italic())?;
        } else {
            writeln!(out, "    {}", preview)?;
        }
    }
    Ok(())
}

fn write_note_detail<W: Write>(out: &mut W, note: &Note) -> Result<()> {
    let title = if note.completed {
        console::style(&note.title).bold().strikethrough()
    } else {
        console::style(&note.title).bold()
    };
    writeln!(out, "{} {}", completion_mark(note.completed), title)?;
    writeln!(out, "ID: {}", note.id)?;
    writeln!(out, "Created: {}", format_timestamp(&note.created_at))?;
    writeln!(out, "Last updated: {}", format_timestamp(&note.updated_at))?;
    writeln!(out)?;
    if note.content.is_empty() {
        writeln!(out, "This note is empty. Edit it to add content.")?;
    } else {
        writeln!(out, "{}", note.content)?;
    }
    Ok(())
}
