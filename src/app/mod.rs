use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::themes::Theme;
use crate::config::{AppConfig, ConfigLoader};
use crate::storage::{NoteRecord, NotesDir, SortMode};

pub mod browser;
pub mod confirm;
pub mod editor;
pub mod input;
pub mod menu;
pub mod screen;
pub mod textbuf;
pub mod theme_picker;

use browser::{BrowseAction, BrowserScreen};
use confirm::ConfirmScreen;
use editor::{EditorOutcome, EditorScreen};
use input::{InputMode, InputOutcome, InputScreen};
use menu::{MenuChoice, MenuScreen};
use screen::{Effect, Screen, ScreenEvent, Step};
use theme_picker::ThemePickerScreen;

type Term = Terminal<CrosstermBackend<Stdout>>;

const IDLE_TICK: Duration = Duration::from_millis(250);

/// Which notes a browse session shows.
#[derive(Debug, Clone)]
pub enum BrowseSource {
    All,
    Search(String),
}

/// Result of the create flow, once the input screen has been left.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CreateOutcome {
    Created(String),
    Failed(String),
}

/// Owns the interactive session: the outer menu loop, the inner browse
/// loop, and the terminal lifecycle around both.
pub struct App {
    dir: NotesDir,
    loader: ConfigLoader,
    config: AppConfig,
    theme: Theme,
    sort: SortMode,
    preview: bool,
}

impl App {
    pub fn new(dir: NotesDir, loader: ConfigLoader, config: AppConfig) -> Self {
        let theme = Theme::load(config.theme);
        let sort = config.default_sort;
        let preview = config.preview.visible;
        Self {
            dir,
            loader,
            config,
            theme,
            sort,
            preview,
        }
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    /// The menu-driven session entered when `ks` runs without a subcommand.
    pub fn run_repl(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.repl_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn repl_loop(&mut self, terminal: &mut Term) -> Result<()> {
        let mut notice: Option<String> = None;
        loop {
            let mut menu = MenuScreen::new(self.theme.clone());
            if let Some(text) = notice.take() {
                menu = menu.with_notice(text);
            }
            match run_screen(terminal, menu)? {
                MenuChoice::Notes => {
                    notice = self.browse_loop(terminal, BrowseSource::All, None)?;
                }
                MenuChoice::NewNote => match self.create_note(terminal)? {
                    Some(CreateOutcome::Created(name)) => {
                        notice = self.browse_loop(
                            terminal,
                            BrowseSource::All,
                            Some(format!("Created '{name}'")),
                        )?;
                    }
                    Some(CreateOutcome::Failed(message)) => notice = Some(message),
                    None => {}
                },
                MenuChoice::Themes => {
                    let picker = ThemePickerScreen::new(self.theme.clone());
                    if let Some(name) = run_screen(terminal, picker)? {
                        self.theme = Theme::load(name);
                        self.config.theme = name;
                        if let Err(err) = self.loader.save(&self.config) {
                            tracing::error!(%err, "persisting theme selection failed");
                            notice = Some(format!("could not save theme: {err}"));
                        }
                    }
                }
                MenuChoice::Quit => return Ok(()),
            }
        }
    }

    /// Browse session for the `list` and `search` commands: same loop as the
    /// REPL, with its own terminal lifecycle.
    pub fn run_browse(&mut self, source: BrowseSource) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.browse_loop(&mut terminal, source, None);
        restore_terminal(&mut terminal)?;
        if let Some(notice) = result? {
            println!("{notice}");
        }
        Ok(())
    }

    /// One pass of the inner loop per iteration: list, sort, run the
    /// browser, dispatch its action, and re-enter carrying the resulting
    /// notification. Returns a notice for the menu when the loop ends.
    fn browse_loop(
        &mut self,
        terminal: &mut Term,
        source: BrowseSource,
        mut pending: Option<String>,
    ) -> Result<Option<String>> {
        loop {
            let records = self.list_source(&source)?;
            if records.is_empty() {
                return Ok(Some(match &source {
                    BrowseSource::All => "No notes yet".to_string(),
                    BrowseSource::Search(keyword) => {
                        format!("No notes matching '{keyword}'")
                    }
                }));
            }

            let mut browser = BrowserScreen::new(
                self.dir.clone(),
                records,
                self.sort,
                self.preview,
                self.theme.clone(),
            );
            if let Some(text) = pending.take() {
                browser.notify(text);
            }
            let outcome = run_screen(terminal, browser)?;
            self.sort = outcome.sort;
            self.preview = outcome.preview;

            match outcome.action {
                BrowseAction::Quit | BrowseAction::Cancel => return Ok(None),
                BrowseAction::Open => {
                    if let Some(record) = outcome.selected {
                        pending = self.open_note(terminal, &record)?;
                    }
                }
                BrowseAction::Create => {
                    pending = match self.create_note(terminal)? {
                        Some(CreateOutcome::Created(name)) => Some(format!("Created '{name}'")),
                        Some(CreateOutcome::Failed(message)) => Some(message),
                        None => None,
                    };
                }
                BrowseAction::Rename => {
                    if let Some(record) = outcome.selected {
                        pending = self.rename_note(terminal, &record)?;
                    }
                }
                BrowseAction::Delete => {
                    if let Some(record) = outcome.selected {
                        pending = Some(match self.dir.delete_note(&record.name) {
                            Ok(()) => format!("Deleted '{}'", record.name),
                            Err(err) => {
                                tracing::error!(name = %record.name, %err, "delete failed");
                                format!("could not delete '{}': {err}", record.name)
                            }
                        });
                    }
                }
            }
        }
    }

    fn list_source(&self, source: &BrowseSource) -> Result<Vec<NoteRecord>> {
        match source {
            BrowseSource::All => self
                .dir
                .list_entries()
                .context("listing the notes directory"),
            BrowseSource::Search(keyword) => {
                let matches = crate::search::search_notes(&self.dir, keyword)
                    .context("searching notes")?;
                Ok(matches.into_iter().map(|m| m.record).collect())
            }
        }
    }

    fn open_note(&mut self, terminal: &mut Term, record: &NoteRecord) -> Result<Option<String>> {
        let content = match self.dir.read_note(&record.name) {
            Ok(content) => content,
            Err(err) => {
                tracing::error!(name = %record.name, %err, "open failed");
                return Ok(Some(format!("could not open '{}': {err}", record.name)));
            }
        };
        let editor = EditorScreen::new(record.name.clone(), content, self.theme.clone());
        match run_screen(terminal, editor)? {
            EditorOutcome::Saved(content) => {
                Ok(Some(match self.dir.write_note(&record.name, &content) {
                    Ok(()) => format!("Saved changes to '{}'", record.name),
                    Err(err) => {
                        tracing::error!(name = %record.name, %err, "save failed");
                        format!("could not save '{}': {err}", record.name)
                    }
                }))
            }
            EditorOutcome::Discarded => Ok(None),
        }
    }

    fn create_note(&mut self, terminal: &mut Term) -> Result<Option<CreateOutcome>> {
        let input = InputScreen::new(InputMode::Create, self.theme.clone());
        match run_screen(terminal, input)? {
            InputOutcome::Submitted { filename, content } => {
                Ok(Some(self.persist_new_note(filename, &content)))
            }
            InputOutcome::Renamed(_) | InputOutcome::Cancelled => Ok(None),
        }
    }

    fn persist_new_note(&self, filename: String, content: &str) -> CreateOutcome {
        match self.dir.write_note(&filename, content) {
            Ok(()) => CreateOutcome::Created(filename),
            Err(err) => {
                tracing::error!(name = %filename, %err, "create failed");
                CreateOutcome::Failed(format!("could not create '{filename}': {err}"))
            }
        }
    }

    fn rename_note(&mut self, terminal: &mut Term, record: &NoteRecord) -> Result<Option<String>> {
        let input = InputScreen::new(
            InputMode::Rename {
                current: record.name.clone(),
            },
            self.theme.clone(),
        );
        match run_screen(terminal, input)? {
            InputOutcome::Renamed(new_name) => {
                Ok(Some(match self.dir.rename_note(&record.name, &new_name) {
                    Ok(()) => format!("Renamed to '{new_name}'"),
                    Err(err) => {
                        tracing::error!(from = %record.name, to = %new_name, %err, "rename failed");
                        format!("could not rename '{}': {err}", record.name)
                    }
                }))
            }
            InputOutcome::Submitted { .. } | InputOutcome::Cancelled => Ok(None),
        }
    }

    /// `read FILENAME` on a TTY: edit the note in place.
    pub fn run_editor_for(&mut self, name: &str) -> Result<()> {
        let content = self.dir.read_note(name).context("reading note")?;
        let mut terminal = setup_terminal()?;
        let editor = EditorScreen::new(name.to_string(), content, self.theme.clone());
        let outcome = run_screen(&mut terminal, editor);
        restore_terminal(&mut terminal)?;
        if let EditorOutcome::Saved(content) = outcome? {
            self.dir.write_note(name, &content).context("saving note")?;
            println!("Saved changes to '{name}'");
        }
        Ok(())
    }

    /// Collects a filename and/or content interactively for the `write` and
    /// `append` commands.
    pub fn collect_input(&mut self, mode: InputMode) -> Result<InputOutcome> {
        let mut terminal = setup_terminal()?;
        let input = InputScreen::new(mode, self.theme.clone());
        let outcome = run_screen(&mut terminal, input);
        restore_terminal(&mut terminal)?;
        outcome
    }

    /// Full-screen yes/no question for destructive CLI commands.
    pub fn confirm(&self, question: &str) -> Result<bool> {
        let mut terminal = setup_terminal()?;
        let confirm = ConfirmScreen::new(question, self.theme.clone());
        let outcome = run_screen(&mut terminal, confirm);
        restore_terminal(&mut terminal)?;
        outcome
    }
}

/// Generic screen runner: draw, wait for one event, dispatch, repeat. The
/// only timer is a poll deadline derived from a scheduled effect; firing it
/// injects a `TimerFired` event into the same stream.
fn run_screen<S: Screen>(terminal: &mut Term, mut screen: S) -> Result<S::Outcome> {
    let mut deadline: Option<(Instant, u64)> = None;
    if let Some(Effect::DismissNotification { generation, after }) = screen.init() {
        deadline = Some((Instant::now() + after, generation));
    }

    loop {
        terminal
            .draw(|frame| screen.draw(frame))
            .context("rendering frame")?;

        let timeout = match deadline {
            Some((at, _)) => at.saturating_duration_since(Instant::now()),
            None => IDLE_TICK,
        };

        let event = if event::poll(timeout).context("polling for terminal events")? {
            match event::read().context("reading terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => ScreenEvent::Key(key),
                Event::Resize(width, height) => ScreenEvent::Resize(width, height),
                _ => continue,
            }
        } else {
            match deadline {
                Some((at, generation)) if Instant::now() >= at => {
                    deadline = None;
                    ScreenEvent::TimerFired(generation)
                }
                _ => continue,
            }
        };

        match screen.on_event(event) {
            Step::Continue => {}
            Step::Schedule(Effect::DismissNotification { generation, after }) => {
                deadline = Some((Instant::now() + after, generation));
            }
            Step::Complete(outcome) => return Ok(outcome),
        }
    }
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
