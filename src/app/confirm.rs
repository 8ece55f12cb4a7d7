use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Alignment;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::config::themes::Theme;
use crate::ui::centered_rect;

use super::screen::{Screen, ScreenEvent, Step};

/// Yes/No dialog. The cursor starts on No so a stray Enter never confirms a
/// destructive action.
pub struct ConfirmScreen {
    question: String,
    cursor_on_yes: bool,
    theme: Theme,
}

impl ConfirmScreen {
    pub fn new(question: impl Into<String>, theme: Theme) -> Self {
        Self {
            question: question.into(),
            cursor_on_yes: false,
            theme,
        }
    }

    pub fn cursor_on_yes(&self) -> bool {
        self.cursor_on_yes
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Step::Complete(false);
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.cursor_on_yes = false;
                Step::Continue
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor_on_yes = true;
                Step::Continue
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => Step::Complete(true),
            KeyCode::Char('n') | KeyCode::Char('N') => Step::Complete(false),
            KeyCode::Enter => Step::Complete(self.cursor_on_yes),
            KeyCode::Char('q') | KeyCode::Esc => Step::Complete(false),
            _ => Step::Continue,
        }
    }
}

impl Screen for ConfirmScreen {
    type Outcome = bool;

    fn on_event(&mut self, event: ScreenEvent) -> Step<bool> {
        match event {
            ScreenEvent::Key(key) => self.handle_key(key),
            ScreenEvent::Resize(..) | ScreenEvent::TimerFired(_) => Step::Continue,
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = centered_rect(50, 30, frame.size());
        frame.render_widget(Clear, area);

        let (no_style, yes_style) = if self.cursor_on_yes {
            (self.theme.unselected, self.theme.selected)
        } else {
            (self.theme.selected, self.theme.unselected)
        };
        let lines = vec![
            Line::from(Span::styled(self.question.clone(), self.theme.primary)),
            Line::default(),
            Line::from(vec![
                Span::styled("[ No ]", no_style),
                Span::raw("   "),
                Span::styled("[ Yes ]", yes_style),
            ])
            .alignment(Alignment::Center),
            Line::default(),
            Line::from(Span::styled(
                "←/→ move · y/n answer · enter confirm",
                self.theme.muted,
            )),
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
