use std::collections::BTreeSet;

use crate::segment::ExtractedTitles;

/// Years counted back from the current year when filtering by recency.
pub const DEFAULT_WINDOW_YEARS: i32 = 4;

/// Keeps titles published within the last `window_years` years.
///
/// A title survives only if it has an associated year and that year is at
/// least `current_year - window_years`. Undated titles are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyFilter {
    current_year: i32,
    window_years: i32,
}

impl RecencyFilter {
    pub fn new(current_year: i32, window_years: i32) -> Self {
        Self {
            current_year,
            window_years,
        }
    }

    pub fn with_default_window(current_year: i32) -> Self {
        Self::new(current_year, DEFAULT_WINDOW_YEARS)
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn window_years(&self) -> i32 {
        self.window_years
    }

    pub fn min_year(&self) -> i32 {
        self.current_year - self.window_years
    }

    pub fn retains(&self, year: Option<i32>) -> bool {
        year.is_some_and(|y| y >= self.min_year())
    }

    pub fn apply(&self, titles: &ExtractedTitles) -> BTreeSet<String> {
        titles
            .iter()
            .filter(|(_, year)| self.retains(*year))
            .map(|(title, _)| title.to_string())
            .collect()
    }
}
