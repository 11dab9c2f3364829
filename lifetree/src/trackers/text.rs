//! Word and character counting from key presses.

use super::TextActivitySource;

/// A key press as reported by the host's keyboard sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    /// Modifiers, navigation and anything else that does not produce text.
    Other,
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        match c {
            ' ' | '\t' => Key::Space,
            '\n' | '\r' => Key::Enter,
            c if c.is_control() => Key::Other,
            c => Key::Char(c),
        }
    }
}

/// Counts typed words and their characters.
///
/// A word is a run of printable keys ended by space or enter. Its trimmed
/// length is added to the character count when it ends.
#[derive(Debug, Clone, Default)]
pub struct TextActivityTracker {
    total_words: u64,
    total_chars: u64,
    current_word: String,
    session_words_start: u64,
    session_chars_start: u64,
}

impl TextActivityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key(&mut self, key: Key) {
        match key {
            Key::Char(c) if c.is_whitespace() => self.flush(),
            Key::Char(c) => self.current_word.push(c),
            Key::Space | Key::Enter => self.flush(),
            Key::Other => {}
        }
    }

    /// Feeds every character of `text` as a key press.
    pub fn on_text(&mut self, text: &str) {
        for c in text.chars() {
            self.on_key(Key::from(c));
        }
    }

    /// Ends the word in progress, if any.
    pub fn flush(&mut self) {
        let word = self.current_word.trim();
        if !word.is_empty() {
            self.total_words += 1;
            self.total_chars += word.chars().count() as u64;
        }
        self.current_word.clear();
    }

    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (self.total_words, self.total_chars)
    }

    /// Marks the start of a focus session for [`session_stats`](Self::session_stats).
    pub fn start_session(&mut self) {
        self.session_words_start = self.total_words;
        self.session_chars_start = self.total_chars;
    }

    /// Words and chars typed since the last [`start_session`](Self::start_session).
    #[must_use]
    pub fn session_stats(&self) -> (u64, u64) {
        (
            self.total_words.saturating_sub(self.session_words_start),
            self.total_chars.saturating_sub(self.session_chars_start),
        )
    }

    /// Seeds the totals with values saved earlier the same day.
    pub fn restore(&mut self, words: u64, chars: u64) {
        self.total_words = words;
        self.total_chars = chars;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl TextActivitySource for TextActivityTracker {
    fn text_stats(&self) -> (u64, u64) {
        self.stats()
    }
}
