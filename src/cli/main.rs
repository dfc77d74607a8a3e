use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(version, about = "Create, edit, complete, search and delete short notes")]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding the saved notes (overrides the config file)
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the notepad application
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_global_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "notepad",
            "--data-dir",
            "/tmp/notes",
            "-v",
            "new",
            "-T",
            "Groceries",
            "-c",
            "milk",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/notes")));
        assert_eq!(
            cli.command,
            Commands::New {
                title: Some("Groceries".to_string()),
                content: Some("milk".to_string()),
                edit: false,
            }
        );
    }

    #[test]
    fn test_search_requires_term() {
        assert!(Cli::try_parse_from(["notepad", "search"]).is_err());
    }
}
