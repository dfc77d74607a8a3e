use std::io::Cursor;

use notepad::{App, Commands, Config, MemoryBackend, NoteStore, Notepad, NotepadError};

fn app() -> App<MemoryBackend, Vec<u8>> {
    let notepad = Notepad::open(NoteStore::new(MemoryBackend::new()));
    App::new(notepad, Config::default(), None, Vec::new())
}

fn output(app: App<MemoryBackend, Vec<u8>>) -> String {
    String::from_utf8(app.into_output()).unwrap()
}

fn new_note(title: &str, content: &str) -> Commands {
    Commands::New {
        title: Some(title.to_string()),
        content: Some(content.to_string()),
        edit: false,
    }
}

#[test]
fn one_shot_commands_create_edit_toggle_and_delete() {
    let mut app = app();
    app.run(new_note("Groceries", "milk")).unwrap();
    let id = app.notepad().notes()[0].id.clone();

    app.run(Commands::Edit {
        id: id.clone(),
        title: None,
        content: Some("milk and eggs".to_string()),
        edit: false,
    })
    .unwrap();
    app.run(Commands::Toggle { id: id.clone() }).unwrap();

    let note = app.notepad().repository().get(&id).unwrap().clone();
    assert_eq!(note.title, "Groceries");
    assert_eq!(note.content, "milk and eggs");
    assert!(note.completed);

    app.run(Commands::Delete {
        id: id.clone(),
        force: true,
    })
    .unwrap();
    assert!(app.notepad().notes().is_empty());

    let out = output(app);
    assert!(out.contains(&format!("Note created with ID: {}", id)));
    assert!(out.contains(&format!("Note {} marked completed", id)));
    assert!(out.contains("has been permanently deleted"));
}

#[test]
fn list_json_is_most_recent_first() {
    let mut app = app();
    app.run(new_note("First", "")).unwrap();
    app.run(new_note("Second", "")).unwrap();

    app.run(Commands::List {
        search: None,
        limit: None,
        json: true,
        brief: false,
    })
    .unwrap();

    let out = output(app);
    let start = out.find('[').unwrap();
    let listed: serde_json::Value = serde_json::from_str(&out[start..]).unwrap();
    assert_eq!(listed[0]["title"], "Second");
    assert_eq!(listed[1]["title"], "First");
}

#[test]
fn search_reports_misses() {
    let mut app = app();
    app.run(new_note("Todo", "buy milk")).unwrap();
    app.run(Commands::Search {
        term: "xyz".to_string(),
        fuzzy: false,
        limit: None,
        json: false,
    })
    .unwrap();

    assert!(output(app).contains("No notes found matching query: \"xyz\""));
}

#[test]
fn unknown_ids_are_reported() {
    let mut app = app();
    assert!(matches!(
        app.run(Commands::View {
            id: "404".to_string(),
            json: false
        }),
        Err(NotepadError::NoteNotFound { .. })
    ));
    assert!(matches!(
        app.run(Commands::Toggle {
            id: "404".to_string()
        }),
        Err(NotepadError::NoteNotFound { .. })
    ));
}

#[test]
fn edit_without_changes_is_rejected() {
    let mut app = app();
    app.run(new_note("Todo", "")).unwrap();
    let id = app.notepad().notes()[0].id.clone();

    let result = app.run(Commands::Edit {
        id,
        title: None,
        content: None,
        edit: false,
    });
    assert!(matches!(result, Err(NotepadError::ApplicationError { .. })));
}

#[test]
fn shell_walks_through_the_session_states() {
    let mut app = app();
    let script = "\
new
title Groceries
append milk
append eggs
save
new
title Scratch
cancel
toggle
list
quit
";
    app.run_shell(Cursor::new(script)).unwrap();

    let notes = app.notepad().notes().to_vec();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Groceries");
    assert_eq!(notes[0].content, "milk\neggs");
    assert!(!notes[0].completed);

    let out = output(app);
    assert!(out.contains("Saved Groceries"));
    assert!(out.contains("Draft discarded"));
    assert!(out.contains("Select a note to toggle first"));
}

#[test]
fn shell_edit_then_switch_selection_drops_draft() {
    let mut app = app();
    app.run(new_note("Keep", "original")).unwrap();
    app.run(new_note("Other", "")).unwrap();
    let keep_id = app.notepad().notes()[1].id.clone();
    let other_id = app.notepad().notes()[0].id.clone();

    let script = format!(
        "select {keep}\nedit\ncontent changed\nselect {other}\ntoggle\nquit\n",
        keep = keep_id,
        other = other_id
    );
    app.run_shell(Cursor::new(script)).unwrap();

    let keep = app.notepad().repository().get(&keep_id).unwrap();
    assert_eq!(keep.content, "original");
    assert!(app.notepad().repository().get(&other_id).unwrap().completed);
}

#[test]
fn shell_delete_selected_returns_to_idle() {
    let mut app = app();
    app.run(new_note("Doomed", "")).unwrap();
    let id = app.notepad().notes()[0].id.clone();

    app.run_shell(Cursor::new(format!("select {}\ndelete\nshow\n", id)))
        .unwrap();

    assert!(app.notepad().notes().is_empty());
    assert_eq!(app.notepad().session().selected_id(), None);
    let out = output(app);
    assert!(out.contains(&format!("Deleted {}", id)));
    assert!(out.contains("Select a note to view"));
}
