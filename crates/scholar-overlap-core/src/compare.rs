use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::normalize::Normalization;
use crate::recency::RecencyFilter;
use crate::segment::ExtractedTitles;

/// Label of the row intersecting every record (only emitted for 3+ records).
pub const ALL_RESEARCHERS_LABEL: &str = "All Researchers";

/// The titles attributed to one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearcherRecord {
    name: String,
    titles: BTreeSet<String>,
}

impl ResearcherRecord {
    pub fn new<S: Into<String>>(name: impl Into<String>, titles: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            titles: titles.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a record from extraction output, applying the recency filter
    /// when one is given.
    pub fn from_extraction(
        name: impl Into<String>,
        titles: &ExtractedTitles,
        recency: Option<&RecencyFilter>,
    ) -> Self {
        let titles = match recency {
            Some(filter) => filter.apply(titles),
            None => titles.title_set(),
        };
        Self {
            name: name.into(),
            titles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn titles(&self) -> &BTreeSet<String> {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Comparison key → display form. When several titles share a key the
    /// lexicographically smallest display form is kept.
    fn key_map(&self, normalization: Normalization) -> BTreeMap<String, &str> {
        let mut map = BTreeMap::new();
        for title in &self.titles {
            map.entry(normalization.key(title)).or_insert(title.as_str());
        }
        map
    }
}

/// One line of the comparison report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub label: String,
    pub count: usize,
    /// Shared titles, sorted.
    pub titles: Vec<String>,
}

impl ComparisonRow {
    fn new(label: String, mut titles: Vec<String>) -> Self {
        titles.sort();
        Self {
            label,
            count: titles.len(),
            titles,
        }
    }

    pub fn is_all_researchers(&self) -> bool {
        self.label == ALL_RESEARCHERS_LABEL
    }
}

pub fn pair_label(a: &str, b: &str) -> String {
    format!("{} ↔ {}", a, b)
}

/// Titles of `a` whose comparison key also occurs in `b`, displayed in `a`'s
/// original form.
pub fn intersect(
    a: &ResearcherRecord,
    b: &ResearcherRecord,
    normalization: Normalization,
) -> Vec<String> {
    let b_keys: BTreeSet<String> = b.titles.iter().map(|t| normalization.key(t)).collect();
    a.key_map(normalization)
        .into_iter()
        .filter(|(key, _)| b_keys.contains(key))
        .map(|(_, display)| display.to_string())
        .collect()
}

/// Titles whose key occurs in every record, displayed in the first record's form.
pub fn intersect_all(records: &[ResearcherRecord], normalization: Normalization) -> Vec<String> {
    let Some((first, rest)) = records.split_first() else {
        return Vec::new();
    };
    let rest_keys: Vec<BTreeSet<String>> = rest
        .iter()
        .map(|r| r.titles.iter().map(|t| normalization.key(t)).collect())
        .collect();
    first
        .key_map(normalization)
        .into_iter()
        .filter(|(key, _)| rest_keys.iter().all(|keys| keys.contains(key)))
        .map(|(_, display)| display.to_string())
        .collect()
}

/// Compare every pair of records, plus an all-records row when there are
/// more than two.
///
/// Pair rows follow combination order over the input order; the
/// "All Researchers" row comes last.
pub fn compare_records(
    records: &[ResearcherRecord],
    normalization: Normalization,
) -> Vec<ComparisonRow> {
    let mut rows = Vec::new();
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            let shared = intersect(a, b, normalization);
            rows.push(ComparisonRow::new(pair_label(&a.name, &b.name), shared));
        }
    }

    if records.len() > 2 {
        let shared = intersect_all(records, normalization);
        rows.push(ComparisonRow::new(ALL_RESEARCHERS_LABEL.to_string(), shared));
    }

    tracing::debug!(
        records = records.len(),
        rows = rows.len(),
        normalization = %normalization,
        "comparison complete"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, titles: &[&str]) -> ResearcherRecord {
        ResearcherRecord::new(name, titles.iter().copied())
    }

    fn keys(titles: &[String], n: Normalization) -> BTreeSet<String> {
        titles.iter().map(|t| n.key(t)).collect()
    }

    #[test]
    fn test_two_records_single_row() {
        let rows = compare_records(
            &[record("a.pdf", &["X", "Y"]), record("b.pdf", &["Y", "Z"])],
            Normalization::Trim,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "a.pdf ↔ b.pdf");
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].titles, vec!["Y".to_string()]);
    }

    #[test]
    fn test_fewer_than_two_records_no_rows() {
        assert!(compare_records(&[], Normalization::Trim).is_empty());
        assert!(compare_records(&[record("a", &["X"])], Normalization::Trim).is_empty());
    }

    #[test]
    fn test_all_researchers_row() {
        let records = [
            record("A", &["X", "Y"]),
            record("B", &["X", "Z"]),
            record("C", &["X"]),
        ];
        let rows = compare_records(&records, Normalization::Trim);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["A ↔ B", "A ↔ C", "B ↔ C", "All Researchers"]);

        let all = rows.last().unwrap();
        assert!(all.is_all_researchers());
        assert_eq!(all.count, 1);
        assert_eq!(all.titles, vec!["X".to_string()]);
        for row in &rows[..3] {
            assert!(row.count >= all.count);
        }
    }

    #[test]
    fn test_no_all_row_for_two_records() {
        let rows = compare_records(
            &[record("A", &["X"]), record("B", &["X"])],
            Normalization::Trim,
        );
        assert!(rows.iter().all(|r| !r.is_all_researchers()));
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let a = record("A", &["Deep Learning", "Graph  Networks", "Solo"]);
        let b = record("B", &["Graph Networks", "Deep Learning", "Other"]);
        for n in [Normalization::Trim, Normalization::StripWhitespace] {
            let ab = intersect(&a, &b, n);
            let ba = intersect(&b, &a, n);
            assert_eq!(ab.len(), ba.len());
            assert_eq!(keys(&ab, n), keys(&ba, n));
        }
    }

    #[test]
    fn test_whitespace_insensitive_matching() {
        let a = record("A", &["Graph  Neural Net works"]);
        let b = record("B", &["Graph Neural Networks"]);
        assert!(intersect(&a, &b, Normalization::Trim).is_empty());
        assert_eq!(
            intersect(&a, &b, Normalization::StripWhitespace),
            vec!["Graph  Neural Net works".to_string()]
        );
    }

    #[test]
    fn test_display_form_taken_from_first_record() {
        let a = record("A", &["Deep  Learning"]);
        let b = record("B", &["Deep Learning"]);
        let rows = compare_records(&[a, b], Normalization::StripWhitespace);
        assert_eq!(rows[0].titles, vec!["Deep  Learning".to_string()]);
    }

    #[test]
    fn test_colliding_keys_counted_once() {
        let a = record("A", &["Deep Learning", "Deep  Learning"]);
        let b = record("B", &["DeepLearning"]);
        let shared = intersect(&a, &b, Normalization::StripWhitespace);
        assert_eq!(shared, vec!["Deep  Learning".to_string()]);
    }

    #[test]
    fn test_titles_sorted_in_row() {
        let rows = compare_records(
            &[record("A", &["b", "C", "a"]), record("B", &["a", "b", "C"])],
            Normalization::Trim,
        );
        assert_eq!(rows[0].titles, vec!["C", "a", "b"]);
        assert_eq!(rows[0].count, 3);
    }

    #[test]
    fn test_all_row_bounded_by_pairs() {
        let records = [
            record("A", &["1", "2", "3", "4"]),
            record("B", &["2", "3", "4"]),
            record("C", &["3", "4", "5"]),
            record("D", &["4", "5", "6"]),
        ];
        let rows = compare_records(&records, Normalization::Trim);
        assert_eq!(rows.len(), 7);
        let all = rows.last().unwrap();
        assert_eq!(all.titles, vec!["4".to_string()]);
        let all_keys: BTreeSet<&String> = all.titles.iter().collect();
        for row in &rows[..6] {
            let pair: BTreeSet<&String> = row.titles.iter().collect();
            assert!(all_keys.is_subset(&pair));
        }
    }

    #[test]
    fn test_record_from_extraction_with_recency() {
        let mut titles = ExtractedTitles::new();
        titles.insert_with_year("Recent", Some(2023));
        titles.insert_with_year("Old", Some(2001));
        titles.insert("Undated");

        let unfiltered = ResearcherRecord::from_extraction("a.pdf", &titles, None);
        assert_eq!(unfiltered.len(), 3);

        let filter = RecencyFilter::with_default_window(2024);
        let filtered = ResearcherRecord::from_extraction("a.pdf", &titles, Some(&filter));
        assert_eq!(filtered.titles(), &BTreeSet::from(["Recent".to_string()]));
        assert_eq!(filtered.name(), "a.pdf");
    }
}
