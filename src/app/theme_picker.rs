use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::config::themes::{Theme, ThemeName};

use super::screen::{Screen, ScreenEvent, Step};

/// Palette chooser. Completes with the picked name, or `None` when dismissed.
pub struct ThemePickerScreen {
    names: Vec<ThemeName>,
    selected: usize,
    active: ThemeName,
    theme: Theme,
}

impl ThemePickerScreen {
    pub fn new(theme: Theme) -> Self {
        let names = ThemeName::all();
        let active = theme.name;
        let selected = names.iter().position(|&name| name == active).unwrap_or(0);
        Self {
            names,
            selected,
            active,
            theme,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<Option<ThemeName>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Step::Complete(None);
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Step::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.names.len() {
                    self.selected += 1;
                }
                Step::Continue
            }
            KeyCode::Enter => Step::Complete(Some(self.names[self.selected])),
            KeyCode::Char('q') | KeyCode::Esc => Step::Complete(None),
            _ => Step::Continue,
        }
    }
}

impl Screen for ThemePickerScreen {
    type Outcome = Option<ThemeName>;

    fn on_event(&mut self, event: ScreenEvent) -> Step<Option<ThemeName>> {
        match event {
            ScreenEvent::Key(key) => self.handle_key(key),
            ScreenEvent::Resize(..) | ScreenEvent::TimerFired(_) => Step::Continue,
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.size());

        let items: Vec<ListItem> = self
            .names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let marker = if *name == self.active { "●" } else { " " };
                let style = if idx == self.selected {
                    self.theme.selected
                } else {
                    self.theme.unselected
                };
                ListItem::new(Line::from(Span::styled(
                    format!(" {marker} {name}"),
                    style,
                )))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .title("Themes")
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(list, chunks[0]);

        let hint = Paragraph::new(Line::from(Span::styled(
            "↑/↓ move · enter apply · q back",
            self.theme.muted,
        )));
        frame.render_widget(hint, chunks[1]);
    }
}
