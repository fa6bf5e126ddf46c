//! Turn the reading cursor into the next speakable phrase.

use crate::word_index::WordIndex;

/// Default upper bound before a phrase is cut without punctuation.
pub const DEFAULT_MAX_PHRASE_WORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub text: String,
    /// Cursor of the first consumed token.
    pub start: usize,
    /// Cursor just past the last consumed token.
    pub end: usize,
    pub word_count: usize,
}

impl Phrase {
    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }
}

/// Consume tokens from `cursor` until a word ends in `.`, `!` or `?`, or the
/// phrase holds more than `max_words` words.
///
/// Whitespace tokens are consumed but never contribute text; words are joined
/// with single spaces. The returned phrase is empty when no word remains.
pub fn extract_phrase(index: &WordIndex, cursor: usize, max_words: usize) -> Phrase {
    let mut words: Vec<&str> = Vec::new();
    let mut end = cursor.min(index.len());

    while let Some(token) = index.get(end) {
        end += 1;
        if token.is_whitespace {
            continue;
        }
        words.push(&token.text);
        if ends_sentence(&token.text) || words.len() > max_words {
            break;
        }
    }

    Phrase {
        text: words.join(" "),
        start: cursor.min(index.len()),
        end,
        word_count: words.len(),
    }
}

fn ends_sentence(word: &str) -> bool {
    word.ends_with(['.', '!', '?'])
}
