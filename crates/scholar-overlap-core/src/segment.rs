use std::collections::{BTreeMap, BTreeSet};

use crate::highlight::{BlueDominant, HighlightClassifier};
use crate::years::latest_year;
use crate::{Document, Span};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum RunState {
    #[default]
    Idle,
    Accumulating(String),
}

/// Color-run segmentation state machine.
///
/// Consecutive highlighted spans are joined into one candidate title; the
/// first plain span after a run closes it. A run may cross line, block and
/// page boundaries, since multi-line titles are emitted as several spans.
pub struct Segmenter<'c> {
    classifier: &'c dyn HighlightClassifier,
    state: RunState,
}

impl<'c> Segmenter<'c> {
    pub fn new(classifier: &'c dyn HighlightClassifier) -> Self {
        Self {
            classifier,
            state: RunState::Idle,
        }
    }

    /// Feed one span. Returns a title when this span closes a run.
    pub fn feed(&mut self, span: &Span) -> Option<String> {
        self.feed_text(&span.text, span.color)
    }

    pub fn feed_text(&mut self, text: &str, color: u32) -> Option<String> {
        let state = std::mem::take(&mut self.state);
        if self.classifier.is_highlighted(color) {
            let buf = match state {
                RunState::Idle => text.to_string(),
                RunState::Accumulating(mut buf) => {
                    append_run_text(&mut buf, text);
                    buf
                }
            };
            self.state = RunState::Accumulating(buf);
            None
        } else {
            match state {
                RunState::Accumulating(buf) => commit(buf),
                RunState::Idle => None,
            }
        }
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, RunState::Accumulating(_))
    }

    /// Flush a run still open at end of input.
    pub fn finish(self) -> Option<String> {
        match self.state {
            RunState::Accumulating(buf) => commit(buf),
            RunState::Idle => None,
        }
    }
}

/// Join span texts with exactly one separating space, without doubling a
/// space the span already carries.
fn append_run_text(buf: &mut String, text: &str) {
    if !buf.is_empty()
        && !buf.ends_with(char::is_whitespace)
        && !text.starts_with(char::is_whitespace)
    {
        buf.push(' ');
    }
    buf.push_str(text);
}

fn commit(buf: String) -> Option<String> {
    let trimmed = buf.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Run the segmenter over a flat span sequence, including the final flush.
pub fn segment_spans<'a>(
    spans: impl IntoIterator<Item = &'a Span>,
    classifier: &dyn HighlightClassifier,
) -> Vec<String> {
    let mut segmenter = Segmenter::new(classifier);
    let mut titles: Vec<String> = spans
        .into_iter()
        .filter_map(|span| segmenter.feed(span))
        .collect();
    titles.extend(segmenter.finish());
    titles
}

/// Titles found in one document, each with the year associated to it (if any).
///
/// Duplicate titles collapse; the first occurrence is kept and a year, once
/// assigned, is never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTitles {
    entries: BTreeMap<String, Option<i32>>,
}

impl ExtractedTitles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a title. Returns `false` when it was already present.
    pub fn insert(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        if self.entries.contains_key(&title) {
            return false;
        }
        self.entries.insert(title, None);
        true
    }

    /// Record a title together with a year (used by tests and mock backends).
    pub fn insert_with_year(&mut self, title: impl Into<String>, year: Option<i32>) -> bool {
        let title = title.into();
        if self.entries.contains_key(&title) {
            return false;
        }
        self.entries.insert(title, year);
        true
    }

    /// Assign `year` to every title that has none yet. Returns how many
    /// titles were assigned.
    pub fn backfill_year(&mut self, year: i32) -> usize {
        let mut assigned = 0;
        for slot in self.entries.values_mut().filter(|y| y.is_none()) {
            *slot = Some(year);
            assigned += 1;
        }
        assigned
    }

    pub fn contains(&self, title: &str) -> bool {
        self.entries.contains_key(title)
    }

    pub fn year(&self, title: &str) -> Option<i32> {
        self.entries.get(title).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of titles with an associated year.
    pub fn dated_count(&self) -> usize {
        self.entries.values().filter(|y| y.is_some()).count()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<i32>)> {
        self.entries.iter().map(|(t, y)| (t.as_str(), *y))
    }

    pub fn title_set(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExtractedTitles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut titles = ExtractedTitles::new();
        for t in iter {
            titles.insert(t);
        }
        titles
    }
}

/// Extracts highlighted titles from a decoded document.
///
/// ```ignore
/// let titles = TitleExtractor::new()
///     .with_year_association(true)
///     .extract(&document);
/// ```
pub struct TitleExtractor {
    classifier: Box<dyn HighlightClassifier>,
    associate_years: bool,
}

impl Default for TitleExtractor {
    fn default() -> Self {
        Self {
            classifier: Box::new(BlueDominant),
            associate_years: false,
        }
    }
}

impl TitleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(mut self, classifier: impl HighlightClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Enable page-scoped year association.
    pub fn with_year_association(mut self, enabled: bool) -> Self {
        self.associate_years = enabled;
        self
    }

    pub fn associates_years(&self) -> bool {
        self.associate_years
    }

    pub fn extract(&self, document: &Document) -> ExtractedTitles {
        let mut titles = ExtractedTitles::new();
        let mut segmenter = Segmenter::new(self.classifier.as_ref());

        for page in document.pages() {
            for span in page.spans() {
                if let Some(title) = segmenter.feed(span) {
                    titles.insert(title);
                }
            }

            if self.associate_years
                && let Some(year) = latest_year(&page.text)
            {
                let assigned = titles.backfill_year(year);
                tracing::trace!(page = page.index, year, assigned, "year association");
            }
        }

        if let Some(title) = segmenter.finish() {
            titles.insert(title);
        }

        tracing::debug!(
            pages = document.page_count(),
            titles = titles.len(),
            dated = titles.dated_count(),
            "segmentation complete"
        );
        titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::ExactColor;
    use crate::{BBox, Block, Line, Page};

    const BLUE: u32 = 0x1A0DAB;
    const GRAY: u32 = 0x777777;

    fn hl(text: &str) -> Span {
        Span::new(text, BLUE)
    }

    fn plain(text: &str) -> Span {
        Span::new(text, GRAY)
    }

    fn page(index: usize, lines: Vec<Vec<Span>>) -> Page {
        let lines = lines.into_iter().map(Line::new).collect();
        Page::new(index, vec![Block::text(BBox::default(), lines)])
    }

    #[test]
    fn test_run_closed_by_plain_span() {
        let spans = [hl("Foo "), hl("Bar"), plain("Baz")];
        let titles = segment_spans(&spans, &BlueDominant);
        assert_eq!(titles, vec!["Foo Bar".to_string()]);
    }

    #[test]
    fn test_trailing_run_committed() {
        let spans = [hl("End")];
        assert_eq!(segment_spans(&spans, &BlueDominant), vec!["End".to_string()]);
    }

    #[test]
    fn test_plain_spans_alone_yield_nothing() {
        let spans = [plain("Cited by"), plain("42")];
        assert!(segment_spans(&spans, &BlueDominant).is_empty());
    }

    #[test]
    fn test_adjacent_spans_without_spaces_are_separated() {
        let spans = [hl("Attention"), hl("is all you"), hl("need"), plain("A Vaswani")];
        assert_eq!(
            segment_spans(&spans, &BlueDominant),
            vec!["Attention is all you need".to_string()]
        );
    }

    #[test]
    fn test_whitespace_only_run_is_not_a_title() {
        let spans = [hl("   "), plain("x"), hl(" "), plain("y")];
        assert!(segment_spans(&spans, &BlueDominant).is_empty());
    }

    #[test]
    fn test_two_runs_two_titles() {
        let spans = [hl("First"), plain("a"), plain("b"), hl("Second"), plain("c")];
        assert_eq!(
            segment_spans(&spans, &BlueDominant),
            vec!["First".to_string(), "Second".to_string()]
        );
    }

    #[test]
    fn test_custom_classifier() {
        let spans = [Span::new("Red title", 0xCC0000), Span::new("blue", 0x0000FF)];
        let titles = segment_spans(&spans, &ExactColor(0xCC0000));
        assert_eq!(titles, vec!["Red title".to_string()]);
    }

    #[test]
    fn test_extractor_with_classifier() {
        let doc = Document::new(vec![page(
            0,
            vec![vec![Span::new("Red title", 0xCC0000), hl("Blue link"), plain("x")]],
        )]);
        let titles = TitleExtractor::new()
            .with_classifier(ExactColor(0xCC0000))
            .extract(&doc);
        assert_eq!(titles.title_set(), BTreeSet::from(["Red title".to_string()]));
    }

    #[test]
    fn test_segmenter_state() {
        let mut seg = Segmenter::new(&BlueDominant);
        assert!(!seg.is_accumulating());
        assert_eq!(seg.feed(&hl("A")), None);
        assert!(seg.is_accumulating());
        assert_eq!(seg.feed(&plain("b")), Some("A".to_string()));
        assert!(!seg.is_accumulating());
        assert_eq!(seg.finish(), None);
    }

    #[test]
    fn test_run_spans_lines_and_pages() {
        let doc = Document::new(vec![
            page(0, vec![vec![plain("Profile")], vec![hl("A very long title that")]]),
            page(1, vec![vec![hl("wraps onto the next page")], vec![plain("B Author")]]),
        ]);
        let titles = TitleExtractor::new().extract(&doc);
        assert_eq!(titles.len(), 1);
        assert!(titles.contains("A very long title that wraps onto the next page"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let doc = Document::new(vec![page(
            0,
            vec![vec![hl("Same"), plain("x"), hl("Same"), plain("y")]],
        )]);
        assert_eq!(TitleExtractor::new().extract(&doc).len(), 1);
    }

    #[test]
    fn test_non_text_blocks_ignored() {
        let mut p = page(0, vec![vec![hl("Title"), plain("author")]]);
        p.blocks.insert(
            0,
            Block::Other {
                bbox: BBox::new(0.0, 0.0, 100.0, 100.0),
            },
        );
        let titles = TitleExtractor::new().extract(&Document::new(vec![p]));
        assert_eq!(titles.title_set(), BTreeSet::from(["Title".to_string()]));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let doc = Document::new(vec![
            page(0, vec![vec![hl("One"), plain("2019")], vec![hl("Two"), plain("2021")]]),
            page(1, vec![vec![hl("Three"), plain("2017")]]),
        ]);
        let extractor = TitleExtractor::new().with_year_association(true);
        assert_eq!(extractor.extract(&doc), extractor.extract(&doc));
    }

    #[test]
    fn test_years_not_associated_by_default() {
        let doc = Document::new(vec![page(0, vec![vec![hl("One")], vec![plain("Nature, 2019")]])]);
        let titles = TitleExtractor::new().extract(&doc);
        assert_eq!(titles.year("One"), None);
    }

    #[test]
    fn test_page_year_backfills_titles() {
        // Last year on the page wins for every title on it.
        let doc = Document::new(vec![page(
            0,
            vec![
                vec![hl("One")],
                vec![plain("Journal, 2018")],
                vec![hl("Two")],
                vec![plain("Conference, 2022")],
            ],
        )]);
        let titles = TitleExtractor::new().with_year_association(true).extract(&doc);
        assert_eq!(titles.year("One"), Some(2022));
        assert_eq!(titles.year("Two"), Some(2022));
    }

    #[test]
    fn test_year_never_reassigned() {
        let doc = Document::new(vec![
            page(0, vec![vec![hl("Old")], vec![plain("Journal, 2015")]]),
            page(1, vec![vec![hl("New")], vec![plain("Journal, 2023")]]),
        ]);
        let titles = TitleExtractor::new().with_year_association(true).extract(&doc);
        assert_eq!(titles.year("Old"), Some(2015));
        assert_eq!(titles.year("New"), Some(2023));
    }

    #[test]
    fn test_page_without_year_defers_assignment() {
        let doc = Document::new(vec![
            page(0, vec![vec![hl("Early")], vec![plain("no year here")]]),
            page(1, vec![vec![plain("Journal, 2021")]]),
        ]);
        let titles = TitleExtractor::new().with_year_association(true).extract(&doc);
        assert_eq!(titles.year("Early"), Some(2021));
    }

    #[test]
    fn test_trailing_title_flushed_without_year() {
        let doc = Document::new(vec![page(
            0,
            vec![vec![plain("Journal, 2020")], vec![hl("Last")]],
        )]);
        let titles = TitleExtractor::new().with_year_association(true).extract(&doc);
        assert!(titles.contains("Last"));
        assert_eq!(titles.year("Last"), None);
    }

    #[test]
    fn test_extracted_titles_first_occurrence_wins() {
        let mut titles = ExtractedTitles::new();
        assert!(titles.insert_with_year("A", Some(2020)));
        assert!(!titles.insert_with_year("A", Some(2010)));
        assert!(!titles.insert("A"));
        assert_eq!(titles.year("A"), Some(2020));
        assert_eq!(titles.backfill_year(2001), 0);
    }
}
