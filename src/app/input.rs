use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::config::themes::Theme;
use crate::storage::{suggest_filename, validate_filename};
use crate::ui::centered_rect;

use super::screen::{Screen, ScreenEvent, Step};
use super::textbuf::EditBuffer;

/// What the input screen is collecting.
#[derive(Debug, Clone)]
pub enum InputMode {
    /// Filename first, then content.
    Create,
    /// Content only, the filename is already known.
    Content { filename: String },
    /// A new filename for an existing note.
    Rename { current: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Filename,
    Content,
    ConfirmDiscard { cursor_on_yes: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Submitted { filename: String, content: String },
    Renamed(String),
    Cancelled,
}

pub struct InputScreen {
    mode: InputMode,
    stage: Stage,
    filename: String,
    error: Option<String>,
    suggestion: Option<String>,
    content: EditBuffer,
    theme: Theme,
}

impl InputScreen {
    pub fn new(mode: InputMode, theme: Theme) -> Self {
        let (stage, filename) = match &mode {
            InputMode::Create => (Stage::Filename, String::new()),
            InputMode::Content { filename } => (Stage::Content, filename.clone()),
            InputMode::Rename { current } => (Stage::Filename, current.clone()),
        };
        Self {
            mode,
            stage,
            filename,
            error: None,
            suggestion: None,
            content: EditBuffer::empty(),
            theme,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    fn accept_filename(&mut self) -> Step<InputOutcome> {
        let trimmed = self.filename.trim().to_string();
        if trimmed.is_empty() {
            self.error = Some("filename cannot be empty".to_string());
            self.suggestion = None;
            return Step::Continue;
        }
        // Renaming to the unchanged name is a no-op, not a rename.
        if let InputMode::Rename { current } = &self.mode {
            if trimmed == *current {
                return Step::Complete(InputOutcome::Cancelled);
            }
        }
        if let Err(err) = validate_filename(&trimmed) {
            self.error = Some(err.to_string());
            self.suggestion = suggest_filename(&trimmed);
            return Step::Continue;
        }
        self.filename = trimmed;
        self.error = None;
        self.suggestion = None;
        match self.mode {
            InputMode::Rename { .. } => Step::Complete(InputOutcome::Renamed(self.filename.clone())),
            _ => {
                self.stage = Stage::Content;
                Step::Continue
            }
        }
    }

    fn handle_filename_key(&mut self, key: KeyEvent) -> Step<InputOutcome> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Step::Complete(InputOutcome::Cancelled);
        }
        match key.code {
            KeyCode::Enter => self.accept_filename(),
            KeyCode::Esc => Step::Complete(InputOutcome::Cancelled),
            KeyCode::Tab => {
                if let Some(suggestion) = self.suggestion.take() {
                    self.filename = suggestion;
                    self.error = None;
                }
                Step::Continue
            }
            KeyCode::Backspace => {
                self.filename.pop();
                Step::Continue
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filename.push(ch);
                Step::Continue
            }
            _ => Step::Continue,
        }
    }

    fn handle_content_key(&mut self, key: KeyEvent) -> Step<InputOutcome> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    return Step::Complete(InputOutcome::Submitted {
                        filename: self.filename.clone(),
                        content: self.content.buffer().to_string(),
                    });
                }
                KeyCode::Char('c') => {
                    self.stage = Stage::ConfirmDiscard { cursor_on_yes: false };
                    return Step::Continue;
                }
                _ => {}
            }
        }
        if key.code == KeyCode::Esc {
            self.stage = Stage::ConfirmDiscard { cursor_on_yes: false };
            return Step::Continue;
        }
        self.content.handle_key(key);
        Step::Continue
    }

    fn handle_discard_key(&mut self, key: KeyEvent) -> Step<InputOutcome> {
        let cursor_on_yes = match self.stage {
            Stage::ConfirmDiscard { cursor_on_yes } => cursor_on_yes,
            _ => false,
        };
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.stage = Stage::ConfirmDiscard { cursor_on_yes: false };
                Step::Continue
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.stage = Stage::ConfirmDiscard { cursor_on_yes: true };
                Step::Continue
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => Step::Complete(InputOutcome::Cancelled),
            KeyCode::Enter if cursor_on_yes => Step::Complete(InputOutcome::Cancelled),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter | KeyCode::Esc => {
                self.stage = Stage::Content;
                Step::Continue
            }
            _ => Step::Continue,
        }
    }
}

impl Screen for InputScreen {
    type Outcome = InputOutcome;

    fn on_event(&mut self, event: ScreenEvent) -> Step<InputOutcome> {
        let key = match event {
            ScreenEvent::Key(key) => key,
            ScreenEvent::Resize(..) | ScreenEvent::TimerFired(_) => return Step::Continue,
        };
        match self.stage {
            Stage::Filename => self.handle_filename_key(key),
            Stage::Content => self.handle_content_key(key),
            Stage::ConfirmDiscard { .. } => self.handle_discard_key(key),
        }
    }

    fn draw(&self, frame: &mut Frame) {
        match &self.stage {
            Stage::Filename => self.draw_filename(frame),
            Stage::Content => self.draw_content(frame),
            Stage::ConfirmDiscard { cursor_on_yes } => {
                self.draw_content(frame);
                self.draw_discard_overlay(frame, *cursor_on_yes);
            }
        }
    }
}

impl InputScreen {
    fn content_title(&self) -> String {
        match self.mode {
            InputMode::Create => format!("New note: {}", self.filename),
            _ => format!("Note: {}", self.filename),
        }
    }

    fn draw_filename(&self, frame: &mut Frame) {
        let title = match self.mode {
            InputMode::Rename { .. } => "Rename note",
            _ => "New note",
        };
        let area = centered_rect(60, 30, frame.size());
        frame.render_widget(Clear, area);

        let mut lines = vec![
            Line::from(Span::styled("Filename:", self.theme.secondary)),
            Line::from(Span::styled(format!("{}▏", self.filename), self.theme.primary)),
        ];
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(error.clone(), self.theme.error)));
        }
        if let Some(suggestion) = &self.suggestion {
            lines.push(Line::from(Span::styled(
                format!("suggestion: {suggestion} (tab to apply)"),
                self.theme.warning,
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "enter accept · esc cancel",
            self.theme.muted,
        )));

        let dialog = Paragraph::new(lines).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(dialog, area);
    }

    fn draw_content(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.size());

        let body = Paragraph::new(self.content.buffer().to_string()).block(
            Block::default()
                .title(self.content_title())
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(self.theme.border)),
        );
        frame.render_widget(body, chunks[0]);

        let (row, col) = self.content.cursor_position();
        frame.set_cursor(chunks[0].x + 1 + col, chunks[0].y + 1 + row);

        let hint = Paragraph::new(Line::from(Span::styled(
            "ctrl+s save · esc discard",
            self.theme.muted,
        )));
        frame.render_widget(hint, chunks[1]);
    }

    fn draw_discard_overlay(&self, frame: &mut Frame, cursor_on_yes: bool) {
        let area = centered_rect(50, 30, frame.size());
        frame.render_widget(Clear, area);
        let (no_style, yes_style) = if cursor_on_yes {
            (self.theme.unselected, self.theme.selected)
        } else {
            (self.theme.selected, self.theme.unselected)
        };
        let lines = vec![
            Line::from(Span::styled(
                "Discard unsaved note?",
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
