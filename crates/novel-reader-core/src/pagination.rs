//! Pagination utilities.
//!
//! The strategy here is intentionally simple: a page is a fixed number of
//! whitespace-separated words. Page text is re-joined with single spaces, so
//! the original line breaks of a chapter do not survive pagination.

/// Default page size in words.
pub const DEFAULT_WORDS_PER_PAGE: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub text: String,
    pub word_count: usize,
}

/// Split chapter text into pages of `words_per_page` words.
pub fn paginate(text: &str, words_per_page: usize) -> Vec<Page> {
    let words_per_page = words_per_page.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(words_per_page)
        .map(|window| Page {
            text: window.join(" "),
            word_count: window.len(),
        })
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn thousand_words_make_three_pages() {
        let pages = paginate(&words(1000), 400);
        let counts: Vec<usize> = pages.iter().map(|p| p.word_count).collect();
        assert_eq!(counts, vec![400, 400, 200]);
    }

    #[test]
    fn page_count_is_ceiling_of_words() {
        for (total, per_page) in [(1, 1), (7, 3), (9, 3), (10, 400), (401, 400)] {
            let pages = paginate(&words(total), per_page);
            assert_eq!(pages.len(), total.div_ceil(per_page), "{total}/{per_page}");
            for page in &pages[..pages.len() - 1] {
                assert_eq!(page.word_count, per_page);
            }
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        let pages = paginate("Hello,\n\n  world.\tAgain", 2);
        assert_eq!(pages[0].text, "Hello, world.");
        assert_eq!(pages[1].text, "Again");
    }

    #[test]
    fn empty_text_has_no_pages() {
        assert!(paginate("   \n", 10).is_empty());
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        assert_eq!(paginate("a b", 0).len(), 2);
    }
}
