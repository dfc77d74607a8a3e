use std::{io, process};

use clap::Parser;
use log::{error, info};

use notepad::{App, Cli, Config, FileBackend, NoteStore, Notepad, Result};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let backend = FileBackend::open(&config.data_dir)?;
    let store = NoteStore::with_key(backend, config.storage_key.clone());
    let notepad = Notepad::open(store);

    let mut app = App::new(notepad, config, cli.config, io::stdout());
    app.run(cli.command)
}

fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");
    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    info!("Application shutting down");
}
