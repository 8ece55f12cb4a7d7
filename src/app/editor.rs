use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::config::themes::Theme;

use super::screen::{Screen, ScreenEvent, Step};
use super::textbuf::EditBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Saved(String),
    Discarded,
}

/// Full-screen editor over an existing note's content.
pub struct EditorScreen {
    filename: String,
    buffer: EditBuffer,
    theme: Theme,
}

impl EditorScreen {
    pub fn new(filename: impl Into<String>, content: String, theme: Theme) -> Self {
        Self {
            filename: filename.into(),
            buffer: EditBuffer::new(content),
            theme,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<EditorOutcome> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    return Step::Complete(EditorOutcome::Saved(self.buffer.buffer().to_string()));
                }
                KeyCode::Char('c') => return Step::Complete(EditorOutcome::Discarded),
                _ => {}
            }
        }
        if key.code == KeyCode::Esc {
            return Step::Complete(EditorOutcome::Discarded);
        }
        self.buffer.handle_key(key);
        Step::Continue
    }
}

impl Screen for EditorScreen {
    type Outcome = EditorOutcome;

    fn on_event(&mut self, event: ScreenEvent) -> Step<EditorOutcome> {
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

        let marker = if self.buffer.is_dirty() { " *" } else { "" };
        let body = Paragraph::new(self.buffer.buffer().to_string()).block(
            Block::default()
                .title(format!("Editing: {}{marker}", self.filename))
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(body, chunks[0]);

        let (row, col) = self.buffer.cursor_position();
        frame.set_cursor(chunks[0].x + 1 + col, chunks[0].y + 1 + row);

        let hint = Paragraph::new(Line::from(Span::styled(
            "ctrl+s save · esc discard · ctrl+z undo",
            self.theme.muted,
        )));
        frame.render_widget(hint, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn key(code: KeyCode) -> ScreenEvent {
        ScreenEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(ch: char) -> ScreenEvent {
        ScreenEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    #[test]
    fn save_returns_the_edited_buffer() {
        let mut editor = EditorScreen::new("a.txt", "hello".to_string(), Theme::default());
        editor.on_event(key(KeyCode::Char('!')));
        assert_matches!(
            editor.on_event(ctrl('s')),
            Step::Complete(EditorOutcome::Saved(content)) if content == "hello!"
        );
    }

    #[test]
    fn escape_discards_changes() {
        let mut editor = EditorScreen::new("a.txt", "hello".to_string(), Theme::default());
        editor.on_event(key(KeyCode::Char('!')));
        assert_matches!(
            editor.on_event(key(KeyCode::Esc)),
            Step::Complete(EditorOutcome::Discarded)
        );
    }

    #[test]
    fn undo_inside_the_editor_reverts_an_edit() {
        let mut editor = EditorScreen::new("a.txt", "hello".to_string(), Theme::default());
        editor.on_event(key(KeyCode::Char('!')));
        editor.on_event(ctrl('z'));
        assert_matches!(
            editor.on_event(ctrl('s')),
            Step::Complete(EditorOutcome::Saved(content)) if content == "hello"
        );
    }
}
