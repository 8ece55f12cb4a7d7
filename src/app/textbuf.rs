use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Multi-line edit buffer with grapheme-aware cursor movement and a bounded
/// undo history. Shared by the editor screen and the content-entry stage of
/// the note input screen.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    buffer: String,
    cursor: usize,
    dirty: bool,
    preferred_column: Option<usize>,
    history: Vec<String>,
    history_index: usize,
}

impl EditBuffer {
    pub fn new(buffer: String) -> Self {
        let cursor = buffer.len();
        let mut history = Vec::with_capacity(128);
        history.push(buffer.clone());
        Self {
            buffer,
            cursor,
            dirty: false,
            preferred_column: None,
            history,
            history_index: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new())
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn into_buffer(self) -> String {
        self.buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cursor position as (row, display column) for terminal rendering.
    pub fn cursor_position(&self) -> (u16, u16) {
        let row = self.buffer[..self.cursor].matches('\n').count();
        let start = line_start(&self.buffer, self.cursor);
        let col = self.buffer[start..self.cursor].width();
        (row as u16, col as u16)
    }

    /// Routes an editing key to the buffer. Returns false when the key is
    /// not an editing key, so callers can layer their own bindings on top.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('z') if ctrl => self.undo(),
            KeyCode::Char('y') if ctrl => self.redo(),
            KeyCode::Char(ch) if !ctrl => self.insert_char(ch),
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left if ctrl => self.move_word_left(),
            KeyCode::Right if ctrl => self.move_word_right(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        };
        true
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.buffer.insert_str(self.cursor, encoded);
        self.cursor += encoded.len();
        self.preferred_column = None;
        self.after_edit();
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        self.buffer.insert(self.cursor, '\n');
        self.cursor += 1;
        self.preferred_column = Some(0);
        self.after_edit();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        self.preferred_column = None;
        self.after_edit();
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.buffer.drain(self.cursor..next);
        self.preferred_column = None;
        self.after_edit();
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        self.preferred_column = None;
        true
    }

    pub fn move_home(&mut self) -> bool {
        let line_start = line_start(&self.buffer, self.cursor);
        if self.cursor == line_start {
            return false;
        }
        self.cursor = line_start;
        self.preferred_column = Some(0);
        true
    }

    pub fn move_end(&mut self) -> bool {
        let line_end = line_end(&self.buffer, self.cursor);
        if self.cursor == line_end {
            return false;
        }
        self.cursor = line_end;
        self.preferred_column = Some(column_at(
            &self.buffer,
            line_start(&self.buffer, self.cursor),
            self.cursor,
        ));
        true
    }

    pub fn move_up(&mut self) -> bool {
        let current_line_start = line_start(&self.buffer, self.cursor);
        let current_column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, current_line_start, self.cursor));
        if current_line_start == 0 {
            if self.cursor == 0 {
                return false;
            }
            self.cursor = 0;
            self.preferred_column = Some(current_column);
            return true;
        }
        let prev_line_end = current_line_start.saturating_sub(1);
        let prev_line_start = line_start(&self.buffer, prev_line_end);
        let target = position_for_column(&self.buffer, prev_line_start, current_column);
        if self.cursor == target {
            return false;
        }
        self.cursor = target;
        self.preferred_column = Some(current_column);
        true
    }

    pub fn move_down(&mut self) -> bool {
        let current_line_start = line_start(&self.buffer, self.cursor);
        let current_column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, current_line_start, self.cursor));
        let current_line_end = line_end(&self.buffer, self.cursor);
        if current_line_end == self.buffer.len() {
            if self.cursor == self.buffer.len() {
                return false;
            }
            self.cursor = self.buffer.len();
            self.preferred_column = Some(current_column);
            return true;
        }
        let next_line_start = current_line_end + 1;
        let target = position_for_column(&self.buffer, next_line_start, current_column);
        if self.cursor == target {
            return false;
        }
        self.cursor = target;
        self.preferred_column = Some(current_column);
        true
    }

    pub fn move_word_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let mut idx = self.cursor;
        while idx > 0 {
            let prev = prev_grapheme_boundary(&self.buffer, idx);
            if self.buffer[prev..idx].trim().is_empty() {
                idx = prev;
            } else {
                break;
            }
        }
        while idx > 0 {
            let prev = prev_grapheme_boundary(&self.buffer, idx);
            if self.buffer[prev..idx].trim().is_empty() {
                break;
            }
            idx = prev;
        }
        self.cursor = idx;
        self.preferred_column = None;
        true
    }

    pub fn move_word_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let mut idx = self.cursor;
        let len = self.buffer.len();

        while idx < len {
            let next = next_grapheme_boundary(&self.buffer, idx);
            if self.buffer[idx..next].trim().is_empty() {
                idx = next;
            } else {
                break;
            }
        }
        while idx < len {
            let next = next_grapheme_boundary(&self.buffer, idx);
            if self.buffer[idx..next].trim().is_empty() {
                break;
            }
            idx = next;
        }
        while idx < len {
            let next = next_grapheme_boundary(&self.buffer, idx);
            if self.buffer[idx..next].trim().is_empty() {
                idx = next;
            } else {
                break;
            }
        }

        if idx == self.cursor {
            return false;
        }
        self.cursor = idx.min(len);
        self.preferred_column = None;
        true
    }

    pub fn undo(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.history_index -= 1;
        self.restore_history_snapshot();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.history_index + 1 >= self.history.len() {
            return false;
        }
        self.history_index += 1;
        self.restore_history_snapshot();
        true
    }

    fn after_edit(&mut self) {
        self.dirty = true;
        self.record_history();
    }

    fn record_history(&mut self) {
        const MAX_HISTORY: usize = 200;
        if let Some(current) = self.history.get(self.history_index) {
            if current.as_str() == self.buffer {
                return;
            }
        }
        self.history.truncate(self.history_index + 1);
        self.history.push(self.buffer.clone());
        if self.history.len() > MAX_HISTORY {
            let overflow = self.history.len() - MAX_HISTORY;
            self.history.drain(0..overflow);
            self.history_index = self.history.len().saturating_sub(1);
        } else {
            self.history_index = self.history.len() - 1;
        }
    }

    fn restore_history_snapshot(&mut self) {
        if let Some(snapshot) = self.history.get(self.history_index).cloned() {
            self.buffer = snapshot;
            if self.cursor > self.buffer.len() {
                self.cursor = self.buffer.len();
            }
            self.dirty = self.history_index != 0;
            self.preferred_column = None;
        }
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in text[..cursor].grapheme_indices(true) {
        last = idx;
    }
    last
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor >= text.len() {
        return text.len();
    }
    let mut iter = text[cursor..].graphemes(true);
    if let Some(grapheme) = iter.next() {
        cursor + grapheme.len()
    } else {
        text.len()
    }
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let line_end = line_end(text, line_start);
    let mut position = line_start;
    let mut count = 0;
    for grapheme in text[line_start..line_end].graphemes(true) {
        if count >= column {
            break;
        }
        position += grapheme.len();
        count += 1;
    }
    if column > count {
        line_end
    } else {
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn undo_redo_cycles() {
        let mut buf = EditBuffer::new("hello".to_string());
        assert!(buf.insert_char('!'));
        assert_eq!(buf.buffer(), "hello!");
        assert!(buf.undo());
        assert_eq!(buf.buffer(), "hello");
        assert!(!buf.undo());
        assert!(buf.redo());
        assert_eq!(buf.buffer(), "hello!");
    }

    #[test]
    fn word_navigation_skips_whitespace() {
        let mut buf = EditBuffer::new("alpha  beta".to_string());
        buf.move_end();
        assert!(buf.move_word_left());
        assert_eq!(buf.cursor, 7); // start of "beta"
        assert!(buf.move_word_left());
        assert_eq!(buf.cursor, 0);
        assert!(buf.move_word_right());
        assert_eq!(buf.cursor, 7);
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut buf = EditBuffer::new("a\u{1F600}".to_string());
        assert!(buf.backspace());
        assert_eq!(buf.buffer(), "a");
    }

    #[test]
    fn vertical_movement_keeps_preferred_column() {
        let mut buf = EditBuffer::new("longer line\nab\nanother".to_string());
        buf.move_up(); // cursor at end of "another", column 7
        buf.move_up();
        let (row, _) = buf.cursor_position();
        assert_eq!(row, 0);
        assert!(buf.move_down());
        // the short middle line clamps, but the column is restored below
        buf.move_down();
        let (row, col) = buf.cursor_position();
        assert_eq!(row, 2);
        assert_eq!(col, 7);
    }

    #[test]
    fn key_routing_covers_editing_keys_only() {
        let mut buf = EditBuffer::empty();
        assert!(buf.handle_key(key(KeyCode::Char('x'))));
        assert!(buf.handle_key(key(KeyCode::Enter)));
        assert_eq!(buf.buffer(), "x\n");
        assert!(!buf.handle_key(key(KeyCode::Esc)));
        assert!(!buf.handle_key(KeyEvent::new(
            KeyCode::Char('s'),
            KeyModifiers::CONTROL
        )));
    }

    #[test]
    fn cursor_position_tracks_rows_and_display_width() {
        let mut buf = EditBuffer::new("one\ntwo".to_string());
        let (row, col) = buf.cursor_position();
        assert_eq!((row, col), (1, 3));
        buf.move_home();
        assert_eq!(buf.cursor_position(), (1, 0));
    }
}
