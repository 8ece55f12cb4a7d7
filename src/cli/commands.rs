use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::input::{InputMode, InputOutcome};
use crate::app::{App, BrowseSource};
use crate::search::{search_notes as run_search, SearchMatch};
use crate::storage::{sort_records, NoteRecord, NotesDir, SortMode};
use crate::ui::{format_size, format_timestamp};

#[derive(Args, Debug, Clone)]
pub struct WriteArgs {
    /// Target note (prompted interactively if omitted)
    pub filename: Option<String>,
    /// Note body. If omitted, reads stdin when piped, or opens the input screen.
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AppendArgs {
    /// Target note (prompted interactively if omitted)
    pub filename: Option<String>,
    /// Text to append. If omitted, reads stdin when piped, or opens the input screen.
    pub content: Option<String>,
    /// Create a missing note without asking
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    pub filename: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    pub filename: String,
    /// Skip the confirmation dialog
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Sort order: name, date, or size
    #[arg(long)]
    pub sort: Option<SortMode>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    pub keyword: String,
}

pub fn write_note(
    app: &mut App,
    dir: &NotesDir,
    args: WriteArgs,
    interactive: bool,
) -> Result<()> {
    match resolve_target(app, args.filename, args.content, interactive)? {
        Some((filename, content)) => {
            dir.write_note(&filename, &content).context("writing note")?;
            println!("Saved '{filename}'");
            Ok(())
        }
        None => Ok(()),
    }
}

pub fn append_note(
    app: &mut App,
    dir: &NotesDir,
    args: AppendArgs,
    interactive: bool,
) -> Result<()> {
    let force = args.force;
    let Some((filename, content)) =
        resolve_target(app, args.filename, args.content, interactive)?
    else {
        return Ok(());
    };

    if !dir.exists(&filename)? && !force {
        if !interactive {
            bail!("note '{filename}' does not exist (pass --force to create it)");
        }
        let question = format!("File '{filename}' does not exist. Create it?");
        if !app.confirm(&question)? {
            println!("Aborted.");
            return Ok(());
        }
    }
    dir.append_note(&filename, &content)
        .context("appending to note")?;
    println!("Appended to '{filename}'");
    Ok(())
}

pub fn read_note(app: &mut App, dir: &NotesDir, args: ReadArgs, interactive: bool) -> Result<()> {
    if interactive {
        app.run_editor_for(&args.filename)
    } else {
        let content = dir.read_note(&args.filename).context("reading note")?;
        print!("{content}");
        Ok(())
    }
}

pub fn delete_note(
    app: &mut App,
    dir: &NotesDir,
    args: DeleteArgs,
    interactive: bool,
) -> Result<()> {
    if !args.force {
        if !interactive {
            bail!("refusing to delete '{}' without --force", args.filename);
        }
        if !app.confirm(&format!("Delete '{}'?", args.filename))? {
            println!("Aborted.");
            return Ok(());
        }
    }
    dir.delete_note(&args.filename).context("deleting note")?;
    println!("Deleted '{}'", args.filename);
    Ok(())
}

pub fn list_notes(app: &mut App, dir: &NotesDir, args: ListArgs, interactive: bool) -> Result<()> {
    if interactive {
        if let Some(sort) = args.sort {
            app.set_sort(sort);
        }
        return app.run_browse(BrowseSource::All);
    }
    let mut records = dir.list_entries().context("listing notes")?;
    sort_records(&mut records, args.sort.unwrap_or_default());
    print!("{}", format_listing(&records));
    Ok(())
}

pub fn search_notes(
    app: &mut App,
    dir: &NotesDir,
    args: SearchArgs,
    interactive: bool,
) -> Result<()> {
    let keyword = args.keyword.trim();
    if keyword.is_empty() {
        bail!("search keyword cannot be empty");
    }
    if interactive {
        return app.run_browse(BrowseSource::Search(keyword.to_string()));
    }
    let matches = run_search(dir, keyword).context("searching notes")?;
    print!("{}", format_matches(&matches));
    Ok(())
}

/// Resolves the (filename, content) pair from positional args, piped stdin,
/// or the interactive input screen. `None` means the user cancelled.
fn resolve_target(
    app: &mut App,
    filename: Option<String>,
    content: Option<String>,
    interactive: bool,
) -> Result<Option<(String, String)>> {
    match (filename, content) {
        (Some(filename), Some(content)) => Ok(Some((filename, content))),
        (Some(filename), None) => {
            if let Some(body) = read_stdin()? {
                return Ok(Some((filename, body)));
            }
            if !interactive {
                bail!("no content provided for '{filename}'");
            }
            match app.collect_input(InputMode::Content { filename })? {
                InputOutcome::Submitted { filename, content } => Ok(Some((filename, content))),
                InputOutcome::Renamed(_) | InputOutcome::Cancelled => Ok(None),
            }
        }
        (None, _) => {
            if !interactive {
                bail!("a filename is required when not attached to a terminal");
            }
            match app.collect_input(InputMode::Create)? {
                InputOutcome::Submitted { filename, content } => Ok(Some((filename, content))),
                InputOutcome::Renamed(_) | InputOutcome::Cancelled => Ok(None),
            }
        }
    }
}

fn format_listing(records: &[NoteRecord]) -> String {
    if records.is_empty() {
        return "No notes found.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            &mut out,
            "{}\t{}\t{}",
            record.name,
            format_size(record.size_bytes),
            format_timestamp(record.modified_at),
        );
    }
    out
}

fn format_matches(matches: &[SearchMatch]) -> String {
    if matches.is_empty() {
        return "No matches found.\n".to_string();
    }
    let mut out = String::new();
    for m in matches {
        let _ = writeln!(&mut out, "{}\t({})", m.record.name, m.location.describe());
    }
    out
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MatchLocation;
    use time::OffsetDateTime;

    fn record(name: &str, size: u64) -> NoteRecord {
        NoteRecord {
            name: name.to_string(),
            modified_at: OffsetDateTime::UNIX_EPOCH,
            size_bytes: size,
        }
    }

    #[test]
    fn listing_prints_one_note_per_line() {
        let records = vec![record("a.txt", 10), record("b.txt", 2048)];
        let out = format_listing(&records);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.txt\t10 B\t"));
        assert!(lines[1].starts_with("b.txt\t2.0 KB\t"));
    }

    #[test]
    fn empty_listing_reports_no_notes() {
        assert_eq!(format_listing(&[]), "No notes found.\n");
    }

    #[test]
    fn match_output_names_the_location() {
        let matches = vec![
            SearchMatch {
                record: record("a.txt", 1),
                location: MatchLocation::Filename,
            },
            SearchMatch {
                record: record("b.txt", 1),
                location: MatchLocation::Both,
            },
        ];
        let out = format_matches(&matches);
        assert!(out.contains("a.txt\t(filename)"));
        assert!(out.contains("b.txt\t(filename, content)"));
    }

    #[test]
    fn empty_match_output_reports_no_matches() {
        assert_eq!(format_matches(&[]), "No matches found.\n");
    }
}
