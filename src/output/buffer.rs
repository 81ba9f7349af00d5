//! Simulated-typing buffer
//!
//! Holds the reconstructed text and a cursor offset. Offsets count characters,
//! not bytes, and always satisfy `0 <= floor <= cursor <= len`. Appended
//! text (window markers, closing rules) raises the floor so backspace cannot
//! erase it.

use super::edit::TypingEdit;

/// Reconstructed text plus the cursor the hook pipeline types at
#[derive(Debug, Default, Clone)]
pub struct TypingBuffer {
    content: String,
    cursor: usize,
    len: usize,
    /// Characters before this offset are protected from backspace
    floor: usize,
}

impl TypingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cursor offset in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the content is empty or ends with a line break
    pub fn at_line_start(&self) -> bool {
        self.content.is_empty() || self.content.ends_with('\n')
    }

    /// Offset below which backspace is a no-op
    pub fn floor(&self) -> usize {
        self.floor
    }

    /// Apply one edit, keeping the cursor within the content
    pub fn apply(&mut self, edit: &TypingEdit) {
        match edit {
            TypingEdit::Insert(c) => self.insert(*c),
            TypingEdit::Backspace => self.backspace(),
            TypingEdit::NewLine => self.append("\n"),
            TypingEdit::Append(text) => {
                self.append(text);
                self.floor = self.len;
            }
        }
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.len += 1;
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor <= self.floor {
            return;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.content.remove(at);
        self.len -= 1;
        self.cursor -= 1;
    }

    fn append(&mut self, text: &str) {
        self.content.push_str(text);
        self.len += text.chars().count();
        self.cursor = self.len;
    }

    /// Byte index of the character at `offset` (or the end of the content)
    fn byte_offset(&self, offset: usize) -> usize {
        self.content
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}
