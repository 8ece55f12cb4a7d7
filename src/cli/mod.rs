use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, ConfigPaths};
use crate::storage::NotesDir;

pub mod commands;

use self::commands::{AppendArgs, DeleteArgs, ListArgs, ReadArgs, SearchArgs, WriteArgs};

#[derive(Parser, Debug)]
#[command(name = "ks", version, about = "Keyboard-first terminal note keeper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over KS_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the notes directory (takes precedence over KS_NOTES_DIR)
    #[arg(long)]
    pub notes_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a note, replacing any existing content
    Write(WriteArgs),
    /// Append to a note, creating it after confirmation when missing
    Append(AppendArgs),
    /// Open a note in the editor, or print it when piped
    Read(ReadArgs),
    /// Delete a note
    Delete(DeleteArgs),
    /// Browse notes, or print a plain listing when piped
    List(ListArgs),
    /// Search note names and contents for a keyword
    Search(SearchArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let paths = ConfigPaths::discover(cli.config.clone(), cli.notes_dir.clone())?;
    let loader = ConfigLoader::new(paths);
    let config = loader.load_or_init()?;
    let dir = NotesDir::open(loader.paths().notes_dir.clone())
        .context("opening the notes directory")?;

    // Checked once; every interactive decision below threads this flag.
    let interactive = atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout);
    let mut app = App::new(dir.clone(), loader, config);

    match cli.command {
        None => {
            if interactive {
                app.run_repl()
            } else {
                Cli::command()
                    .print_help()
                    .context("printing command help")?;
                Ok(())
            }
        }
        Some(Commands::Write(args)) => commands::write_note(&mut app, &dir, args, interactive),
        Some(Commands::Append(args)) => commands::append_note(&mut app, &dir, args, interactive),
        Some(Commands::Read(args)) => commands::read_note(&mut app, &dir, args, interactive),
        Some(Commands::Delete(args)) => commands::delete_note(&mut app, &dir, args, interactive),
        Some(Commands::List(args)) => commands::list_notes(&mut app, &dir, args, interactive),
        Some(Commands::Search(args)) => commands::search_notes(&mut app, &dir, args, interactive),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
