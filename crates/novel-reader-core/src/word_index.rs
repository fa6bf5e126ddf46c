//! Flat token view of a document.
//!
//! The index splits the raw text into alternating runs of non-whitespace
//! (words) and whitespace. Concatenating every token reproduces the input
//! exactly. A cursor is an index into this token sequence; word positions
//! count only the non-whitespace tokens before a cursor.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub is_whitespace: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    tokens: Vec<Token>,
    /// `words_before[i]` is the number of word tokens in `tokens[..i]`.
    words_before: Vec<usize>,
}

impl WordIndex {
    pub fn build(text: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::new();
        let mut current = String::new();
        let mut current_ws = false;

        for ch in text.chars() {
            let ws = ch.is_whitespace();
            if !current.is_empty() && ws != current_ws {
                tokens.push(Token {
                    text: std::mem::take(&mut current),
                    is_whitespace: current_ws,
                });
            }
            current_ws = ws;
            current.push(ch);
        }
        if !current.is_empty() {
            tokens.push(Token {
                text: current,
                is_whitespace: current_ws,
            });
        }

        let mut words_before = Vec::with_capacity(tokens.len() + 1);
        let mut seen = 0usize;
        for token in &tokens {
            words_before.push(seen);
            if !token.is_whitespace {
                seen += 1;
            }
        }
        words_before.push(seen);

        Self {
            tokens,
            words_before,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, cursor: usize) -> Option<&Token> {
        self.tokens.get(cursor)
    }

    pub fn word_count(&self) -> usize {
        self.words_before.last().copied().unwrap_or(0)
    }

    /// Number of word tokens strictly before `cursor` (clamped to the end).
    pub fn words_before(&self, cursor: usize) -> usize {
        let idx = cursor.min(self.tokens.len());
        self.words_before.get(idx).copied().unwrap_or(0)
    }

    /// Token index of the `word`-th (0-based) word token; the end of the
    /// index when fewer words exist.
    pub fn cursor_for_word(&self, word: usize) -> usize {
        if word >= self.word_count() {
            return self.tokens.len();
        }
        // First token whose prefix count equals `word` and that is a word.
        let start = self.words_before.partition_point(|&count| count < word);
        (start..self.tokens.len())
            .find(|&idx| !self.tokens[idx].is_whitespace)
            .unwrap_or(self.tokens.len())
    }

    /// Token index of the last word token, or 0 for an index without words.
    pub fn last_word_cursor(&self) -> usize {
        self.tokens
            .iter()
            .rposition(|token| !token.is_whitespace)
            .unwrap_or(0)
    }

    pub fn has_words_from(&self, cursor: usize) -> bool {
        self.words_before(cursor) < self.word_count()
    }

    /// Reading progress at `cursor`, in percent of all words.
    pub fn progress_pct(&self, cursor: usize) -> f64 {
        let total = self.word_count();
        if total == 0 {
            return 0.0;
        }
        (self.words_before(cursor) as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_reproduce_the_text() {
        let text = "  Hello,\tworld!\n\nSecond  line. ";
        let index = WordIndex::build(text);
        let joined: String = index.tokens().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(index.word_count(), 4);
        assert!(index.tokens()[0].is_whitespace);
    }

    #[test]
    fn tokens_alternate_between_words_and_whitespace() {
        let index = WordIndex::build("one two  three");
        let kinds: Vec<bool> = index.tokens().iter().map(|t| t.is_whitespace).collect();
        assert_eq!(kinds, vec![false, true, false, true, false]);
    }

    #[test]
    fn cursor_for_word_skips_whitespace() {
        let index = WordIndex::build(" a b  c");
        assert_eq!(index.cursor_for_word(0), 1);
        assert_eq!(index.cursor_for_word(1), 3);
        assert_eq!(index.cursor_for_word(2), 5);
        assert_eq!(index.cursor_for_word(3), index.len());
        assert_eq!(index.words_before(index.cursor_for_word(2)), 2);
    }

    #[test]
    fn words_before_clamps_past_the_end() {
        let index = WordIndex::build("a b");
        assert_eq!(index.words_before(99), 2);
        assert!(!index.has_words_from(index.len()));
        assert!(index.has_words_from(0));
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let index = WordIndex::build("");
        assert!(index.is_empty());
        assert_eq!(index.word_count(), 0);
        assert_eq!(index.cursor_for_word(0), 0);
        assert_eq!(index.progress_pct(0), 0.0);
    }

    #[test]
    fn progress_is_word_based() {
        let index = WordIndex::build("a b c d");
        assert_eq!(index.progress_pct(index.cursor_for_word(2)), 50.0);
        assert_eq!(index.last_word_cursor(), 6);
    }
}
