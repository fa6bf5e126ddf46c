//! Text splitting helpers for sentence selection on a page.

use std::ops::Range;

/// Very lightweight sentence splitter based on punctuation.
///
/// Returns byte ranges into `text`. A sentence ends after a run of `.`, `!`
/// or `?`; trailing text without punctuation forms a final sentence.
/// Whitespace-only fragments are dropped. Text with no sentence at all
/// yields a single range covering it.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_terminator(ch) {
            continue;
        }
        // Keep runs like "?!" or "..." together.
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = next_idx + next.len_utf8();
            chars.next();
        }
        push_span(text, &mut spans, start, end);
        start = end;
    }
    push_span(text, &mut spans, start, text.len());

    if spans.is_empty() {
        spans.push(0..text.len());
    }
    spans
}

/// Sentences of `text` as owned strings, trimmed.
pub fn split_sentences(text: &str) -> Vec<String> {
    sentence_spans(text)
        .into_iter()
        .map(|span| text[span].trim().to_string())
        .collect()
}

/// Number of words that start before byte `offset` and lie entirely before
/// it. A word straddling `offset` is not counted.
pub fn words_before_offset(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    let prefix = &text[..offset];
    let mut count = prefix.split_whitespace().count();
    let straddles = prefix.chars().next_back().is_some_and(|c| !c.is_whitespace())
        && text[offset..].chars().next().is_some_and(|c| !c.is_whitespace());
    if straddles {
        count = count.saturating_sub(1);
    }
    count
}

fn push_span(text: &str, spans: &mut Vec<Range<usize>>, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let fragment = &text[start..end];
    let Some(lead) = fragment.find(|c: char| !c.is_whitespace()) else {
        return;
    };
    spans.push(start + lead..end);
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        assert_eq!(
            split_sentences("One. Two! Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
    }

    #[test]
    fn punctuation_runs_stay_together() {
        assert_eq!(split_sentences("Wait... What?! Ok."), vec!["Wait...", "What?!", "Ok."]);
    }

    #[test]
    fn spans_start_at_first_non_whitespace() {
        let text = "A b.  C d.";
        let spans = sentence_spans(text);
        assert_eq!(&text[spans[1].clone()], "C d.");
    }

    #[test]
    fn text_without_sentences_is_one_span() {
        assert_eq!(sentence_spans("   "), vec![0..3]);
        assert_eq!(sentence_spans(""), vec![0..0]);
    }

    #[test]
    fn straddling_words_are_not_counted() {
        let text = "Mr.Smith went home.";
        // The second sentence starts inside "Mr.Smith".
        assert_eq!(words_before_offset(text, 3), 0);
        assert_eq!(words_before_offset(text, 9), 1);
        assert_eq!(words_before_offset(text, text.len()), 3);
    }
}
