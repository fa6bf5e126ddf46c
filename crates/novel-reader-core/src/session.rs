//! The open document and everything derived from it.
//!
//! A session is rebuilt wholesale whenever a new document is loaded. The
//! reading cursor is the only part that changes afterwards, together with the
//! navigation position.

use crate::cache::ProgressRecord;
use crate::chapters::{self, Chapter};
use crate::loader::Document;
use crate::navigation::{ChapterLayout, NavigationState, Position};
use crate::pagination::{self, Page};
use crate::text_utils::{sentence_spans, split_sentences, words_before_offset};
use crate::word_index::WordIndex;
use tracing::{debug, info};

/// What the presentation layer shows for the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub source_name: String,
    pub chapter_title: String,
    pub chapter_index: usize,
    pub chapter_count: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub sentences: Vec<String>,
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub is_first_chapter: bool,
    pub is_last_chapter: bool,
}

#[derive(Debug, Clone)]
pub struct ReaderSession {
    document: Document,
    chapters: Vec<Chapter>,
    pages: Vec<Vec<Page>>,
    index: WordIndex,
    navigation: NavigationState,
    cursor: usize,
}

impl ReaderSession {
    /// Build every derived structure for `document`, restoring `saved` when
    /// given. The saved word position is resolved against the fresh index.
    pub fn open(document: Document, words_per_page: usize, saved: Option<&ProgressRecord>) -> Self {
        let chapters = chapters::segment(&document.raw_text);
        let pages: Vec<Vec<Page>> = chapters
            .iter()
            .map(|chapter| pagination::paginate(&chapter.text, words_per_page))
            .collect();
        let layout = chapters
            .iter()
            .zip(&pages)
            .map(|(chapter, pages)| ChapterLayout {
                word_count: pagination::word_count(&chapter.text),
                page_word_counts: pages.iter().map(|page| page.word_count).collect(),
            })
            .collect();
        let index = WordIndex::build(&document.raw_text);
        let mut navigation = NavigationState::new(layout);

        let mut cursor = 0;
        if let Some(record) = saved {
            navigation.restore(Position {
                chapter: record.chapter_index,
                page: record.page_index,
            });
            cursor = index.cursor_for_word(record.word_cursor);
            debug!(
                chapter = record.chapter_index,
                page = record.page_index,
                word = record.word_cursor,
                "Restored saved reading position"
            );
        }

        info!(
            source = %document.source_name,
            chapters = chapters.len(),
            words = index.word_count(),
            "Opened document"
        );

        Self {
            document,
            chapters,
            pages,
            index,
            navigation,
            cursor,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn source_name(&self) -> &str {
        &self.document.source_name
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn index(&self) -> &WordIndex {
        &self.index
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationState {
        &mut self.navigation
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.index.len());
    }

    /// Words before the cursor.
    pub fn word_position(&self) -> usize {
        self.index.words_before(self.cursor)
    }

    pub fn has_words_remaining(&self) -> bool {
        self.index.has_words_from(self.cursor)
    }

    pub fn progress_pct(&self) -> f64 {
        self.index.progress_pct(self.cursor)
    }

    pub fn current_page(&self) -> Option<&Page> {
        let position = self.navigation.position();
        self.pages.get(position.chapter)?.get(position.page)
    }

    pub fn page_sentences(&self) -> Vec<String> {
        self.current_page()
            .map(|page| split_sentences(&page.text))
            .unwrap_or_default()
    }

    /// Move the cursor to the first word of the current page.
    pub fn cursor_to_page_start(&mut self) {
        let position = self.navigation.position();
        let offset = self.navigation.word_offset(position.chapter, position.page);
        self.cursor = self.index.cursor_for_word(offset);
    }

    /// Cursor for sentence `sentence` of the current page; never after the
    /// sentence's first word. `None` when the page has no such sentence.
    pub fn cursor_for_sentence(&self, sentence: usize) -> Option<usize> {
        let page = self.current_page()?;
        let span = sentence_spans(&page.text).into_iter().nth(sentence)?;
        let position = self.navigation.position();
        let target = self.navigation.word_offset(position.chapter, position.page)
            + words_before_offset(&page.text, span.start);
        Some(self.index.cursor_for_word(target))
    }

    /// Advance one page when the cursor has moved past the words of the
    /// current chapter's pages up to and including the current page.
    ///
    /// Only a single page is turned per call; a step that crosses several
    /// boundaries leaves the page behind the cursor until the next check.
    pub fn turn_page_if_crossed(&mut self) -> bool {
        let relative = self
            .word_position()
            .saturating_sub(self.navigation.chapter_word_offset());
        if relative > self.navigation.cumulative_words_through_current_page() {
            return self.navigation.next_page();
        }
        false
    }

    pub fn progress_record(&self) -> ProgressRecord {
        let position = self.navigation.position();
        ProgressRecord::new(
            &self.document.source_name,
            position.chapter,
            position.page,
            self.word_position(),
        )
    }

    pub fn page_view(&self) -> PageView {
        let position = self.navigation.position();
        PageView {
            source_name: self.document.source_name.clone(),
            chapter_title: self
                .chapters
                .get(position.chapter)
                .map(|chapter| chapter.title.clone())
                .unwrap_or_default(),
            chapter_index: position.chapter,
            chapter_count: self.chapters.len(),
            page_index: position.page,
            page_count: self.navigation.total_pages(position.chapter),
            sentences: self.page_sentences(),
            is_first_page: self.navigation.is_first_page(),
            is_last_page: self.navigation.is_last_page(),
            is_first_chapter: self.navigation.is_first_chapter(),
            is_last_chapter: self.navigation.is_last_chapter(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    pub(crate) fn session(text: &str, words_per_page: usize) -> ReaderSession {
        let document = Document::new(text.to_string(), "test").unwrap();
        ReaderSession::open(document, words_per_page, None)
    }

    #[test]
    fn two_chapter_scenario() {
        let s = session("Chapter 1: A. Word word word. Chapter 2: B. More text.", 400);
        let titles: Vec<&str> = s.chapters().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(s.navigation().word_offset(1, 0), 6);
        assert_eq!(s.index().word_count(), 11);
    }

    #[test]
    fn thousand_words_paginate_into_three_pages() {
        let s = session(&words(1000), 400);
        assert_eq!(s.navigation().total_pages(0), 3);
        assert_eq!(s.navigation().word_offset(0, 2), 800);
    }

    #[test]
    fn sentence_jump_lands_on_the_first_word_of_the_sentence() {
        let mut s = session("Alpha beta. Gamma delta epsilon! Zeta eta. Theta iota. Kappa.", 5);
        // Page 1: "Zeta eta. Theta iota. Kappa."
        s.navigation_mut().next_page();
        assert_eq!(s.page_sentences(), vec!["Zeta eta.", "Theta iota.", "Kappa."]);
        let cursor = s.cursor_for_sentence(1).unwrap();
        assert_eq!(s.index().get(cursor).unwrap().text, "Theta");
        assert!(s.cursor_for_sentence(3).is_none());
    }

    #[test]
    fn sentence_jump_never_passes_the_sentence_start() {
        let text = "One two. Three four five. Six. Seven eight nine ten. Eleven.";
        let mut s = session(text, 4);
        loop {
            let view = s.page_view();
            let page_offset = s.navigation().word_offset(view.chapter_index, view.page_index);
            let page_words: Vec<String> = s
                .current_page()
                .unwrap()
                .text
                .split_whitespace()
                .map(str::to_string)
                .collect();
            for (k, sentence) in view.sentences.iter().enumerate() {
                let cursor = s.cursor_for_sentence(k).unwrap();
                let first_word = sentence.split_whitespace().next().unwrap();
                let first_idx = page_words.iter().position(|w| w == first_word).unwrap();
                assert!(s.index().words_before(cursor) <= page_offset + first_idx);
            }
            if !s.navigation_mut().next_page() {
                break;
            }
        }
    }

    #[test]
    fn page_turn_compares_chapter_relative_words() {
        let mut s = session(&words(1000), 400);
        s.set_cursor(s.index().cursor_for_word(400));
        assert!(!s.turn_page_if_crossed());
        s.set_cursor(s.index().cursor_for_word(401));
        assert!(s.turn_page_if_crossed());
        assert_eq!(s.navigation().page_index(), 1);
    }

    #[test]
    fn small_pages_turn_only_one_page_per_check() {
        let mut s = session(&words(50), 10);
        s.set_cursor(s.index().cursor_for_word(35));
        assert!(s.turn_page_if_crossed());
        assert_eq!(s.navigation().page_index(), 1);
        // The cursor is already on page 3; further checks catch up one page each.
        assert!(s.turn_page_if_crossed());
        assert!(s.turn_page_if_crossed());
        assert!(!s.turn_page_if_crossed());
        assert_eq!(s.navigation().page_index(), 3);
    }

    #[test]
    fn saved_progress_is_restored() {
        let document = Document::new(words(1000), "book").unwrap();
        let record = ProgressRecord::new("book", 0, 2, 820);
        let s = ReaderSession::open(document, 400, Some(&record));
        assert_eq!(s.navigation().page_index(), 2);
        assert_eq!(s.word_position(), 820);
        let saved = s.progress_record();
        assert_eq!(saved.page_index, 2);
        assert_eq!(saved.word_cursor, 820);
    }

    #[test]
    fn cursor_to_page_start_follows_navigation() {
        let mut s = session(&words(30), 10);
        s.navigation_mut().go_to_page(2);
        s.cursor_to_page_start();
        assert_eq!(s.word_position(), 20);
        assert_eq!(s.index().get(s.cursor()).unwrap().text, "w20");
    }

    #[test]
    fn words_containing_heading_text_keep_offsets_aligned() {
        let mut s = session("Prologue text. Chapter 1 begins. Subchapter 2 here. More words.", 400);
        assert_eq!(s.navigation().chapter_count(), 2);
        let end = s.navigation().word_offset(1, s.navigation().total_pages(1));
        assert_eq!(end, s.index().word_count());

        assert!(s.navigation_mut().next_chapter());
        let cursor = s.cursor_for_sentence(1).unwrap();
        assert_eq!(s.index().get(cursor).unwrap().text, "Subchapter");
    }
}
