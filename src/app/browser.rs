use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::themes::Theme;
use crate::storage::{sort_records, NoteRecord, NotesDir, SortMode};
use crate::ui::{centered_rect, format_size, format_timestamp};

use super::screen::{Effect, Screen, ScreenEvent, Step, NOTIFICATION_TTL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseAction {
    Open,
    Create,
    Rename,
    Delete,
    Quit,
    Cancel,
}

/// Everything the orchestrator needs to continue after the browser returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseOutcome {
    pub action: BrowseAction,
    pub selected: Option<NoteRecord>,
    pub sort: SortMode,
    pub preview: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browsing,
    Filtering,
    ConfirmingDelete { cursor_on_yes: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Preview {
    Empty,
    Content(String),
    Unreadable(String),
}

/// The note list state machine: navigation, live filtering, a delete
/// overlay, sort cycling, and a self-expiring notification.
pub struct BrowserScreen {
    dir: NotesDir,
    records: Vec<NoteRecord>,
    visible: Vec<usize>,
    selected: usize,
    sort: SortMode,
    preview_visible: bool,
    preview: Preview,
    filter: String,
    mode: Mode,
    notification: Option<Notification>,
    next_generation: u64,
    last_size: (u16, u16),
    theme: Theme,
}

impl BrowserScreen {
    pub fn new(
        dir: NotesDir,
        mut records: Vec<NoteRecord>,
        sort: SortMode,
        preview_visible: bool,
        theme: Theme,
    ) -> Self {
        sort_records(&mut records, sort);
        let visible = (0..records.len()).collect();
        let mut screen = Self {
            dir,
            records,
            visible,
            selected: 0,
            sort,
            preview_visible,
            preview: Preview::Empty,
            filter: String::new(),
            mode: Mode::Browsing,
            notification: None,
            next_generation: 0,
            last_size: (80, 24),
            theme,
        };
        screen.refresh_preview();
        screen
    }

    /// Seeds a notification carried over from a previous screen. Each call
    /// bumps the generation so an expiry scheduled for an older message
    /// cannot clear this one.
    pub fn notify(&mut self, text: impl Into<String>) -> Effect {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.notification = Some(Notification {
            text: text.into(),
            generation,
        });
        Effect::DismissNotification {
            generation,
            after: NOTIFICATION_TTL,
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn selected_record(&self) -> Option<&NoteRecord> {
        self.visible
            .get(self.selected)
            .and_then(|&idx| self.records.get(idx))
    }

    fn complete(&self, action: BrowseAction) -> Step<BrowseOutcome> {
        Step::Complete(BrowseOutcome {
            action,
            selected: self.selected_record().cloned(),
            sort: self.sort,
            preview: self.preview_visible,
        })
    }

    fn move_selection(&mut self, delta: i64) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        let next = (self.selected as i64 + delta).clamp(0, last as i64) as usize;
        if next != self.selected {
            self.selected = next;
            self.refresh_preview();
        }
    }

    fn refresh_preview(&mut self) {
        if !self.preview_visible {
            self.preview = Preview::Empty;
            return;
        }
        self.preview = match self.selected_record() {
            Some(record) => match self.dir.read_note(&record.name) {
                Ok(content) => Preview::Content(content),
                Err(err) => {
                    tracing::warn!(name = %record.name, %err, "preview read failed");
                    Preview::Unreadable(err.to_string())
                }
            },
            None => Preview::Empty,
        };
    }

    fn cycle_sort(&mut self) {
        let keep = self.selected_record().map(|record| record.name.clone());
        self.sort = self.sort.next();
        sort_records(&mut self.records, self.sort);
        self.recompute_visible(keep.as_deref());
    }

    fn recompute_visible(&mut self, keep_name: Option<&str>) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                needle.is_empty() || record.name.to_lowercase().contains(&needle)
            })
            .map(|(idx, _)| idx)
            .collect();
        self.selected = keep_name
            .and_then(|name| {
                self.visible
                    .iter()
                    .position(|&idx| self.records[idx].name == name)
            })
            .unwrap_or_else(|| self.selected.min(self.visible.len().saturating_sub(1)));
        self.refresh_preview();
    }

    fn handle_browsing_key(&mut self, key: KeyEvent) -> Step<BrowseOutcome> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.complete(BrowseAction::Quit);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.complete(BrowseAction::Cancel),
            KeyCode::Enter => {
                if self.selected_record().is_some() {
                    self.complete(BrowseAction::Open)
                } else {
                    Step::Continue
                }
            }
            KeyCode::Char('n') => self.complete(BrowseAction::Create),
            KeyCode::Char('e') => {
                if self.selected_record().is_some() {
                    self.complete(BrowseAction::Rename)
                } else {
                    Step::Continue
                }
            }
            KeyCode::Char('d') => {
                if self.selected_record().is_some() {
                    self.mode = Mode::ConfirmingDelete { cursor_on_yes: false };
                }
                Step::Continue
            }
            KeyCode::Char('s') => {
                self.cycle_sort();
                Step::Continue
            }
            KeyCode::Char('p') => {
                self.preview_visible = !self.preview_visible;
                let (width, height) = self.last_size;
                self.on_event(ScreenEvent::Resize(width, height))
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Filtering;
                Step::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                Step::Continue
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                Step::Continue
            }
            _ => Step::Continue,
        }
    }

    fn handle_filtering_key(&mut self, key: KeyEvent) -> Step<BrowseOutcome> {
        match key.code {
            KeyCode::Esc => {
                self.filter.clear();
                self.mode = Mode::Browsing;
                self.recompute_visible(None);
            }
            KeyCode::Enter => {
                self.mode = Mode::Browsing;
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.recompute_visible(None);
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter.push(ch);
                self.recompute_visible(None);
            }
            _ => {}
        }
        Step::Continue
    }

    fn handle_delete_key(&mut self, key: KeyEvent) -> Step<BrowseOutcome> {
        let cursor_on_yes = match self.mode {
            Mode::ConfirmingDelete { cursor_on_yes } => cursor_on_yes,
            _ => false,
        };
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.mode = Mode::ConfirmingDelete { cursor_on_yes: false };
                Step::Continue
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.mode = Mode::ConfirmingDelete { cursor_on_yes: true };
                Step::Continue
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => self.complete(BrowseAction::Delete),
            KeyCode::Enter if cursor_on_yes => self.complete(BrowseAction::Delete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter | KeyCode::Esc
            | KeyCode::Char('q') => {
                self.mode = Mode::Browsing;
                Step::Continue
            }
            _ => Step::Continue,
        }
    }
}

impl Screen for BrowserScreen {
    type Outcome = BrowseOutcome;

    fn init(&mut self) -> Option<Effect> {
        self.notification.as_ref().map(|notification| {
            Effect::DismissNotification {
                generation: notification.generation,
                after: NOTIFICATION_TTL,
            }
        })
    }

    fn on_event(&mut self, event: ScreenEvent) -> Step<BrowseOutcome> {
        match event {
            ScreenEvent::Key(key) => match self.mode {
                Mode::Browsing => self.handle_browsing_key(key),
                Mode::Filtering => self.handle_filtering_key(key),
                Mode::ConfirmingDelete { .. } => self.handle_delete_key(key),
            },
            ScreenEvent::Resize(width, height) => {
                self.last_size = (width, height);
                self.refresh_preview();
                Step::Continue
            }
            ScreenEvent::TimerFired(generation) => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|notification| notification.generation == generation)
                {
                    self.notification = None;
                }
                Step::Continue
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.size());

        let title = format!("Notes (sorted by: {})", self.sort);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(title, self.theme.header))),
            chunks[0],
        );

        let body = if self.preview_visible {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(chunks[1])
        } else {
            Layout::default()
                .constraints([Constraint::Percentage(100)])
                .split(chunks[1])
        };

        let items: Vec<ListItem> = self
            .visible
            .iter()
            .enumerate()
            .map(|(pos, &idx)| {
                let record = &self.records[idx];
                let style = if pos == self.selected {
                    self.theme.selected
                } else {
                    self.theme.unselected
                };
                let label = format!(
                    "{}  {}  {}",
                    record.name,
                    format_size(record.size_bytes),
                    format_timestamp(record.modified_at),
                );
                ListItem::new(Line::from(Span::styled(label, style)))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(list, body[0]);

        if self.preview_visible {
            let (text, style) = self.preview_display();
            let preview = Paragraph::new(text).style(style).wrap(Wrap { trim: false }).block(
                Block::default()
                    .title("Preview")
                    .borders(Borders::ALL)
                    .border_style(ratatui::style::Style::default().fg(self.theme.border)),
            );
            frame.render_widget(preview, body[1]);
        }

        if let Some(notification) = &self.notification {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    notification.text.clone(),
                    self.theme.success,
                ))),
                chunks[2],
            );
        }

        let hint = if self.mode == Mode::Filtering {
            format!("filter: {}▏  (enter accept · esc clear)", self.filter)
        } else if self.filter.is_empty() {
            "enter open · n new · e rename · d delete · s sort · p preview · / filter · q back"
                .to_string()
        } else {
            format!("filter: {}  (/ edit)", self.filter)
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hint, self.theme.muted))),
            chunks[3],
        );

        if let Mode::ConfirmingDelete { cursor_on_yes } = self.mode {
            self.draw_delete_overlay(frame, cursor_on_yes);
        }
    }
}

impl BrowserScreen {
    fn preview_display(&self) -> (String, ratatui::style::Style) {
        match &self.preview {
            Preview::Empty => (String::new(), self.theme.muted),
            Preview::Content(content) => (content.clone(), self.theme.primary),
            Preview::Unreadable(err) => (format!("cannot read note: {err}"), self.theme.error),
        }
    }

    fn draw_delete_overlay(&self, frame: &mut Frame, cursor_on_yes: bool) {
        let name = self
            .selected_record()
            .map(|record| record.name.clone())
            .unwrap_or_default();
        let area = centered_rect(50, 30, frame.size());
        frame.render_widget(Clear, area);
        let (no_style, yes_style) = if cursor_on_yes {
            (self.theme.unselected, self.theme.selected)
        } else {
            (self.theme.selected, self.theme.unselected)
        };
        let lines = vec![
            Line::from(Span::styled(
                format!("Delete '{name}'?"),
                self.theme.warning,
            )),
            Line::default(),
            Line::from(vec![
                Span::styled("[ No ]", no_style),
                Span::raw("   "),
                Span::styled("[ Yes ]", yes_style),
            ])
            .alignment(Alignment::Center),
        ];
        let dialog = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .title("Confirm")
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(dialog, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> ScreenEvent {
        ScreenEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn seeded(temp: &TempDir) -> BrowserScreen {
        let dir = NotesDir::open(temp.path().join("notes")).expect("open notes dir");
        dir.write_note("alpha.txt", "first note").expect("write");
        dir.write_note("beta.txt", "second note").expect("write");
        dir.write_note("gamma.txt", "third note").expect("write");
        let records = dir.list_entries().expect("list");
        BrowserScreen::new(dir, records, SortMode::Name, true, Theme::default())
    }

    #[test]
    fn selection_moves_and_clamps() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Up));
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("alpha.txt"));
        for _ in 0..10 {
            browser.on_event(key(KeyCode::Down));
        }
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("gamma.txt"));
    }

    #[test]
    fn enter_opens_the_selected_note() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Down));
        assert_matches!(
            browser.on_event(key(KeyCode::Enter)),
            Step::Complete(BrowseOutcome {
                action: BrowseAction::Open,
                selected: Some(record),
                ..
            }) if record.name == "beta.txt"
        );
    }

    #[test]
    fn escape_cancels_and_ctrl_c_quits() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        assert_matches!(
            browser.on_event(key(KeyCode::Esc)),
            Step::Complete(BrowseOutcome { action: BrowseAction::Cancel, .. })
        );
        let mut browser = seeded(&temp);
        assert_matches!(
            browser.on_event(ScreenEvent::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            ))),
            Step::Complete(BrowseOutcome { action: BrowseAction::Quit, .. })
        );
    }

    #[test]
    fn delete_overlay_defaults_to_no() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('d')));
        // Enter on the default cursor declines and navigation resumes
        assert_matches!(browser.on_event(key(KeyCode::Enter)), Step::Continue);
        browser.on_event(key(KeyCode::Down));
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("beta.txt"));
    }

    #[test]
    fn delete_overlay_suspends_navigation() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('d')));
        browser.on_event(key(KeyCode::Down));
        browser.on_event(key(KeyCode::Char('n')));
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("alpha.txt"));
    }

    #[test]
    fn confirming_delete_reports_the_selected_record() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('d')));
        browser.on_event(key(KeyCode::Right));
        assert_matches!(
            browser.on_event(key(KeyCode::Enter)),
            Step::Complete(BrowseOutcome {
                action: BrowseAction::Delete,
                selected: Some(record),
                ..
            }) if record.name == "alpha.txt"
        );
    }

    #[test]
    fn sort_cycle_preserves_the_selected_note() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Down)); // beta.txt
        browser.on_event(key(KeyCode::Char('s')));
        assert_eq!(browser.sort(), SortMode::Date);
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("beta.txt"));
    }

    #[test]
    fn filtering_narrows_the_list_incrementally() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('/')));
        browser.on_event(key(KeyCode::Char('P')));
        browser.on_event(key(KeyCode::Char('h')));
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("alpha.txt"));
        browser.on_event(key(KeyCode::Enter));
        // the accepted filter stays active while browsing
        browser.on_event(key(KeyCode::Down));
        assert_eq!(browser.selected_record().map(|r| r.name.as_str()), Some("alpha.txt"));
    }

    #[test]
    fn escape_clears_the_filter() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('/')));
        browser.on_event(key(KeyCode::Char('z')));
        assert!(browser.selected_record().is_none());
        browser.on_event(key(KeyCode::Esc));
        assert!(browser.selected_record().is_some());
        // esc left filtering mode, so the next esc cancels the screen
        assert_matches!(
            browser.on_event(key(KeyCode::Esc)),
            Step::Complete(BrowseOutcome { action: BrowseAction::Cancel, .. })
        );
    }

    #[test]
    fn notification_expires_only_for_its_own_generation() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.notify("Created 'alpha.txt'");
        let effect = browser.notify("Deleted 'beta.txt'");
        let Effect::DismissNotification { generation, .. } = effect;

        // stale expiry from the first message is a no-op
        browser.on_event(ScreenEvent::TimerFired(generation - 1));
        assert!(browser.notification().is_some());

        browser.on_event(ScreenEvent::TimerFired(generation));
        assert!(browser.notification().is_none());
    }

    #[test]
    fn unreadable_preview_renders_in_the_error_style() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        std::fs::remove_file(temp.path().join("notes/alpha.txt")).expect("remove note");
        browser.on_event(ScreenEvent::Resize(80, 24)); // forces a preview refresh
        let (text, style) = browser.preview_display();
        assert!(text.contains("cannot read note"));
        assert_eq!(style, Theme::default().error);
    }

    #[test]
    fn readable_preview_shows_the_note_body() {
        let temp = TempDir::new().expect("temp dir");
        let browser = seeded(&temp);
        let (text, style) = browser.preview_display();
        assert_eq!(text, "first note");
        assert_eq!(style, Theme::default().primary);
    }

    #[test]
    fn preview_toggle_survives_into_the_outcome() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('p')));
        assert_matches!(
            browser.on_event(key(KeyCode::Esc)),
            Step::Complete(BrowseOutcome { preview: false, .. })
        );
    }

    #[test]
    fn sort_mode_travels_with_the_outcome() {
        let temp = TempDir::new().expect("temp dir");
        let mut browser = seeded(&temp);
        browser.on_event(key(KeyCode::Char('s')));
        browser.on_event(key(KeyCode::Char('s')));
        assert_matches!(
            browser.on_event(key(KeyCode::Esc)),
            Step::Complete(BrowseOutcome { sort: SortMode::Size, .. })
        );
    }
}
