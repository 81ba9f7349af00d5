//! Edits issued against the typing buffer
//!
//! The hook pipeline never writes buffer text directly; it decides on an edit
//! and hands it to the buffer.

use std::fmt;

/// One mutation of the simulated-typing buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingEdit {
    /// Insert a character at the cursor and advance past it
    Insert(char),

    /// Remove the character before the cursor (no-op at offset 0)
    Backspace,

    /// Append a line break at the end of the content
    NewLine,

    /// Append text at the end of the content (window markers, closing rule)
    Append(String),
}

impl fmt::Display for TypingEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypingEdit::Insert(c) => write!(f, "INSERT({:?})", c),
            TypingEdit::Backspace => write!(f, "BACKSPACE"),
            TypingEdit::NewLine => write!(f, "NEWLINE"),
            TypingEdit::Append(text) => write!(f, "APPEND({} chars)", text.chars().count()),
        }
    }
}
