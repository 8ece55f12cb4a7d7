use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::config::themes::Theme;

use super::screen::{Screen, ScreenEvent, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Notes,
    NewNote,
    Themes,
    Quit,
}

const ENTRIES: [(MenuChoice, &str); 4] = [
    (MenuChoice::Notes, "Notes"),
    (MenuChoice::NewNote, "New Note"),
    (MenuChoice::Themes, "Themes"),
    (MenuChoice::Quit, "Quit"),
];

pub struct MenuScreen {
    selected: usize,
    notice: Option<String>,
    theme: Theme,
}

impl MenuScreen {
    pub fn new(theme: Theme) -> Self {
        Self {
            selected: 0,
            notice: None,
            theme,
        }
    }

    /// One-line message shown under the header, e.g. after an empty browse.
    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<MenuChoice> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Step::Complete(MenuChoice::Quit);
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Step::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < ENTRIES.len() {
                    self.selected += 1;
                }
                Step::Continue
            }
            KeyCode::Enter => Step::Complete(ENTRIES[self.selected].0),
            KeyCode::Char('q') => Step::Complete(MenuChoice::Quit),
            _ => Step::Continue,
        }
    }
}

impl Screen for MenuScreen {
    type Outcome = MenuChoice;

    fn on_event(&mut self, event: ScreenEvent) -> Step<MenuChoice> {
        match event {
            ScreenEvent::Key(key) => self.handle_key(key),
            ScreenEvent::Resize(..) | ScreenEvent::TimerFired(_) => Step::Continue,
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(frame.size());

        let header = Paragraph::new(Line::from(Span::styled("ks notes", self.theme.header)));
        frame.render_widget(header, chunks[0]);

        if let Some(notice) = &self.notice {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(notice.clone(), self.theme.warning))),
                chunks[1],
            );
        }

        let items: Vec<ListItem> = ENTRIES
            .iter()
            .enumerate()
            .map(|(idx, (_, label))| {
                let style = if idx == self.selected {
                    self.theme.selected
                } else {
                    self.theme.unselected
                };
                ListItem::new(Line::from(Span::styled(format!("  {label}"), style)))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(list, chunks[2]);

        let hint = Paragraph::new(Line::from(Span::styled(
            "↑/↓ move · enter select · q quit",
            self.theme.muted,
        )));
        frame.render_widget(hint, chunks[3]);
    }
}
