//! Chapter and page position.
//!
//! Out-of-range moves are silent no-ops. Every operation reports whether the
//! position changed so callers can halt reading and re-render.

/// Word counts of one chapter and of each of its pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterLayout {
    pub word_count: usize,
    pub page_word_counts: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub chapter: usize,
    pub page: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    layout: Vec<ChapterLayout>,
    chapter_index: usize,
    page_index: usize,
}

impl NavigationState {
    pub fn new(layout: Vec<ChapterLayout>) -> Self {
        Self {
            layout,
            chapter_index: 0,
            page_index: 0,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            chapter: self.chapter_index,
            page: self.page_index,
        }
    }

    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn chapter_count(&self) -> usize {
        self.layout.len()
    }

    pub fn total_pages(&self, chapter: usize) -> usize {
        self.layout
            .get(chapter)
            .map(|c| c.page_word_counts.len())
            .unwrap_or(0)
    }

    pub fn is_first_page(&self) -> bool {
        self.page_index == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.page_index + 1 >= self.total_pages(self.chapter_index)
    }

    pub fn is_first_chapter(&self) -> bool {
        self.chapter_index == 0
    }

    pub fn is_last_chapter(&self) -> bool {
        self.chapter_index + 1 >= self.layout.len()
    }

    /// Restore a saved position, clamping it into range.
    pub fn restore(&mut self, position: Position) {
        if self.layout.is_empty() {
            return;
        }
        self.chapter_index = position.chapter.min(self.layout.len() - 1);
        let pages = self.total_pages(self.chapter_index);
        self.page_index = position.page.min(pages.saturating_sub(1));
    }

    pub fn next_page(&mut self) -> bool {
        if !self.is_last_page() {
            self.page_index += 1;
            return true;
        }
        self.next_chapter()
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page_index == 0 {
            return false;
        }
        self.page_index -= 1;
        true
    }

    pub fn next_chapter(&mut self) -> bool {
        if self.is_last_chapter() {
            return false;
        }
        self.chapter_index += 1;
        self.page_index = 0;
        true
    }

    pub fn previous_chapter(&mut self) -> bool {
        if self.chapter_index == 0 {
            return false;
        }
        self.chapter_index -= 1;
        self.page_index = 0;
        true
    }

    pub fn go_to_chapter(&mut self, chapter: usize) -> bool {
        if chapter >= self.layout.len() {
            return false;
        }
        let changed = chapter != self.chapter_index || self.page_index != 0;
        self.chapter_index = chapter;
        self.page_index = 0;
        changed
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= self.total_pages(self.chapter_index) || page == self.page_index {
            return false;
        }
        self.page_index = page;
        true
    }

    /// Words preceding the start of `page` in `chapter`: all words of earlier
    /// chapters plus the words of earlier pages of that chapter.
    pub fn word_offset(&self, chapter: usize, page: usize) -> usize {
        let before_chapter: usize = self
            .layout
            .iter()
            .take(chapter)
            .map(|c| c.word_count)
            .sum();
        let before_page: usize = self
            .layout
            .get(chapter)
            .map(|c| c.page_word_counts.iter().take(page).sum())
            .unwrap_or(0);
        before_chapter + before_page
    }

    /// Words of the current chapter's pages up to and including the current
    /// page.
    pub fn cumulative_words_through_current_page(&self) -> usize {
        self.layout
            .get(self.chapter_index)
            .map(|c| c.page_word_counts.iter().take(self.page_index + 1).sum())
            .unwrap_or(0)
    }

    /// Words preceding the current chapter.
    pub fn chapter_word_offset(&self) -> usize {
        self.word_offset(self.chapter_index, 0)
    }

    /// Locate the page containing the `word`-th word of the document.
    pub fn position_for_word(&self, word: usize) -> Position {
        let mut remaining = word;
        for (chapter, layout) in self.layout.iter().enumerate() {
            if remaining < layout.word_count {
                let mut page = 0;
                for (idx, count) in layout.page_word_counts.iter().enumerate() {
                    page = idx;
                    if remaining < *count {
                        break;
                    }
                    remaining -= count;
                }
                return Position { chapter, page };
            }
            remaining -= layout.word_count;
        }
        let chapter = self.layout.len().saturating_sub(1);
        Position {
            chapter,
            page: self.total_pages(chapter).saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(chapters: &[&[usize]]) -> Vec<ChapterLayout> {
        chapters
            .iter()
            .map(|pages| ChapterLayout {
                word_count: pages.iter().sum(),
                page_word_counts: pages.to_vec(),
            })
            .collect()
    }

    #[test]
    fn next_page_rolls_into_next_chapter() {
        let mut nav = NavigationState::new(layout(&[&[400, 10], &[5]]));
        assert!(nav.next_page());
        assert_eq!(nav.position(), Position { chapter: 0, page: 1 });
        assert!(nav.next_page());
        assert_eq!(nav.position(), Position { chapter: 1, page: 0 });
        assert!(!nav.next_page());
        assert_eq!(nav.position(), Position { chapter: 1, page: 0 });
    }

    #[test]
    fn previous_moves_never_underflow() {
        let mut nav = NavigationState::new(layout(&[&[3, 3]]));
        assert!(!nav.previous_page());
        assert!(!nav.previous_chapter());
        assert_eq!(nav.position(), Position::default());
    }

    #[test]
    fn changing_chapter_resets_page() {
        let mut nav = NavigationState::new(layout(&[&[3, 3], &[3, 3]]));
        nav.next_page();
        assert!(nav.next_chapter());
        assert_eq!(nav.page_index(), 0);
        nav.next_page();
        assert!(nav.previous_chapter());
        assert_eq!(nav.position(), Position::default());
    }

    #[test]
    fn out_of_range_targets_are_ignored() {
        let mut nav = NavigationState::new(layout(&[&[3], &[3]]));
        assert!(!nav.go_to_chapter(5));
        assert!(!nav.go_to_page(3));
        assert!(nav.go_to_chapter(1));
        assert!(nav.is_last_chapter());
        assert!(!nav.is_first_chapter());
    }

    #[test]
    fn word_offset_sums_prior_chapters_and_pages() {
        let nav = NavigationState::new(layout(&[&[400, 400, 200], &[400, 50]]));
        assert_eq!(nav.word_offset(0, 0), 0);
        assert_eq!(nav.word_offset(0, 2), 800);
        assert_eq!(nav.word_offset(1, 0), 1000);
        assert_eq!(nav.word_offset(1, 1), 1400);
    }

    #[test]
    fn word_offset_is_monotonic() {
        let nav = NavigationState::new(layout(&[&[7, 7, 1], &[], &[4, 2], &[9]]));
        let mut last = 0;
        for chapter in 0..4 {
            for page in 0..nav.total_pages(chapter).max(1) {
                let offset = nav.word_offset(chapter, page);
                assert!(offset >= last, "({chapter},{page})");
                last = offset;
            }
        }
    }

    #[test]
    fn restore_clamps_into_range() {
        let mut nav = NavigationState::new(layout(&[&[3, 3], &[3]]));
        nav.restore(Position { chapter: 9, page: 9 });
        assert_eq!(nav.position(), Position { chapter: 1, page: 0 });
    }

    #[test]
    fn position_for_word_finds_the_page() {
        let nav = NavigationState::new(layout(&[&[4, 4], &[3]]));
        assert_eq!(nav.position_for_word(0), Position { chapter: 0, page: 0 });
        assert_eq!(nav.position_for_word(5), Position { chapter: 0, page: 1 });
        assert_eq!(nav.position_for_word(8), Position { chapter: 1, page: 0 });
        assert_eq!(nav.position_for_word(99), Position { chapter: 1, page: 0 });
    }
}
