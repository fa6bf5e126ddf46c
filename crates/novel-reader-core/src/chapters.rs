//! Chapter detection.
//!
//! Headings are found by an ordered list of rules. The first rule that
//! matches anywhere in the text wins and every one of its matches becomes a
//! chapter boundary; later rules are never consulted. Text without any
//! heading becomes a single chapter.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const FALLBACK_TITLE: &str = "Full Text";
pub const FRONT_MATTER_TITLE: &str = "Front Matter";

static RE_CHAPTER_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bchapter\s+\d+").unwrap());
static RE_CHAPTER_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bchapter\s+[ivxlcdm]+\b").unwrap());
static RE_PART_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpart\s+\d+").unwrap());
static RE_BOOK_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bbook\s+\d+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub text: String,
    /// Byte offset of the chapter's first character in the source text.
    pub start_offset: usize,
}

/// A named heading grammar.
#[derive(Debug, Clone)]
pub struct HeadingRule {
    pub name: &'static str,
    pattern: Regex,
}

impl HeadingRule {
    pub fn new(name: &'static str, pattern: Regex) -> Self {
        Self { name, pattern }
    }

    /// Matches with their starts moved back to the start of the enclosing
    /// word, so a boundary never splits a word in two.
    fn find_all(&self, text: &str) -> Vec<(usize, String)> {
        let mut found: Vec<(usize, String)> = Vec::new();
        for m in self.pattern.find_iter(text) {
            let start = word_start(text, m.start());
            if found.last().is_some_and(|(last, _)| *last == start) {
                continue;
            }
            found.push((start, m.as_str().to_string()));
        }
        found
    }
}

fn word_start(text: &str, offset: usize) -> usize {
    text[..offset]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    rules: Vec<HeadingRule>,
}

impl Default for ChapterSegmenter {
    fn default() -> Self {
        Self {
            rules: vec![
                HeadingRule::new("chapter-number", RE_CHAPTER_NUMBER.clone()),
                HeadingRule::new("chapter-roman", RE_CHAPTER_ROMAN.clone()),
                HeadingRule::new("part-number", RE_PART_NUMBER.clone()),
                HeadingRule::new("book-number", RE_BOOK_NUMBER.clone()),
            ],
        }
    }
}

impl ChapterSegmenter {
    pub fn with_rules(rules: Vec<HeadingRule>) -> Self {
        Self { rules }
    }

    /// Append a rule with the lowest priority.
    pub fn push_rule(&mut self, rule: HeadingRule) {
        self.rules.push(rule);
    }

    pub fn segment(&self, text: &str) -> Vec<Chapter> {
        let winner = self
            .rules
            .iter()
            .map(|rule| (rule.name, rule.find_all(text)))
            .find(|(_, matches)| !matches.is_empty());

        let Some((rule_name, matches)) = winner else {
            debug!("No chapter headings found; using a single chapter");
            return vec![Chapter {
                title: FALLBACK_TITLE.to_string(),
                text: text.to_string(),
                start_offset: 0,
            }];
        };
        debug!(
            rule = rule_name,
            chapters = matches.len(),
            "Detected chapter headings"
        );

        let mut chapters = Vec::with_capacity(matches.len() + 1);
        let first_start = matches[0].0;
        let preamble = &text[..first_start];
        let has_front_matter = preamble.chars().any(|c| !c.is_whitespace());
        if has_front_matter {
            chapters.push(Chapter {
                title: FRONT_MATTER_TITLE.to_string(),
                text: preamble.to_string(),
                start_offset: 0,
            });
        }

        for (idx, (start, title)) in matches.iter().enumerate() {
            let end = matches
                .get(idx + 1)
                .map(|(next, _)| *next)
                .unwrap_or(text.len());
            // Whitespace-only preamble belongs to the first chapter.
            let start = if idx == 0 && !has_front_matter { 0 } else { *start };
            chapters.push(Chapter {
                title: title.clone(),
                text: text[start..end].to_string(),
                start_offset: start,
            });
        }
        chapters
    }
}

pub fn segment(text: &str) -> Vec<Chapter> {
    ChapterSegmenter::default().segment(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(chapters: &[Chapter]) -> String {
        chapters.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn splits_on_chapter_number_headings() {
        let text = "Chapter 1: A. Word word word. Chapter 2: B. More text.";
        let chapters = segment(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[1].title, "Chapter 2");
        assert_eq!(chapters[0].text, "Chapter 1: A. Word word word. ");
        assert_eq!(chapters[1].text, "Chapter 2: B. More text.");
        assert_eq!(chapters[1].start_offset, text.find("Chapter 2").unwrap());
        assert_eq!(concat(&chapters), text);
    }

    #[test]
    fn text_without_headings_is_one_chapter() {
        let text = "Just some prose.\nNothing to see here.";
        let chapters = segment(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, FALLBACK_TITLE);
        assert_eq!(chapters[0].text, text);
        assert_eq!(chapters[0].start_offset, 0);
    }

    #[test]
    fn empty_text_still_yields_a_chapter() {
        let chapters = segment("");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].text, "");
    }

    #[test]
    fn first_matching_rule_wins() {
        let text = "Part 1 intro. Chapter 1 begins. Part 2 later. Chapter 2 ends.";
        let chapters = segment(text);
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec![FRONT_MATTER_TITLE, "Chapter 1", "Chapter 2"]);
        assert_eq!(concat(&chapters), text);
    }

    #[test]
    fn roman_headings_are_detected_case_insensitively() {
        let text = "CHAPTER I\nThe start.\nchapter ii\nThe end.";
        let chapters = segment(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "CHAPTER I");
        assert_eq!(chapters[1].title, "chapter ii");
        assert_eq!(concat(&chapters), text);
    }

    #[test]
    fn whitespace_preamble_is_folded_into_first_chapter() {
        let text = "\n\n  Book 1\nAlpha.\nBook 2\nBeta.";
        let chapters = segment(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].start_offset, 0);
        assert!(chapters[0].text.starts_with("\n\n  Book 1"));
        assert_eq!(concat(&chapters), text);
    }

    #[test]
    fn adjacent_headings_each_get_a_chapter() {
        let text = "Chapter 1 Chapter 2 body";
        let chapters = segment(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].text, "Chapter 1 ");
        assert_eq!(concat(&chapters), text);
    }

    #[test]
    fn custom_rules_extend_the_evaluator() {
        let mut segmenter = ChapterSegmenter::with_rules(Vec::new());
        segmenter.push_rule(HeadingRule::new(
            "act",
            Regex::new(r"(?i)act\s+\d+").unwrap(),
        ));
        let chapters = segmenter.segment("Act 1 open. Act 2 close.");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].title, "Act 2");
    }

    #[test]
    fn headings_inside_words_are_ignored() {
        let text = "Prologue text. Subchapter 1 here. Counterpart 2 and Notebook 3.";
        let chapters = segment(text);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, FALLBACK_TITLE);
    }

    #[test]
    fn boundaries_never_split_a_word() {
        let mut segmenter = ChapterSegmenter::with_rules(Vec::new());
        segmenter.push_rule(HeadingRule::new(
            "scene",
            Regex::new(r"(?i)scene\s+\d+").unwrap(),
        ));
        let text = "Intro words. Subscene 1 starts here.";
        let chapters = segmenter.segment(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].text, "Intro words. ");
        assert_eq!(chapters[1].text, "Subscene 1 starts here.");
        assert_eq!(concat(&chapters), text);
    }
}
