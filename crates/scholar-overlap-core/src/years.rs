use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

/// The last publication-year token (1900–2099) in `text`, scanning lines in
/// order and matches left to right within each line.
///
/// This is the page-scoped "most recent year seen" used for year
/// association: titles on a page inherit the last year printed on it.
pub fn latest_year(text: &str) -> Option<i32> {
    let mut latest = None;
    for line in text.lines() {
        for m in YEAR_RE.find_iter(line) {
            if let Ok(year) = m.as_str().parse::<i32>() {
                latest = Some(year);
            }
        }
    }
    latest
}
