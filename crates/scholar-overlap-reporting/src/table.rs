use scholar_overlap_core::ComparisonRow;

use crate::HEADERS;

/// The Titles column of a row: one `- title` line per shared title, or
/// `None` when nothing is shared.
pub fn titles_cell(row: &ComparisonRow) -> String {
    if row.titles.is_empty() {
        return "None".to_string();
    }
    row.titles
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n")
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, w: usize) -> String {
    let fill = w.saturating_sub(width(s));
    format!("{}{}", s, " ".repeat(fill))
}

/// Render rows as a plain-text table. Multi-title cells continue on
/// following lines with the first two columns left blank.
pub fn render_table(rows: &[ComparisonRow]) -> String {
    let cells: Vec<(String, String, String)> = rows
        .iter()
        .map(|r| (r.label.clone(), r.count.to_string(), titles_cell(r)))
        .collect();

    let w0 = cells
        .iter()
        .map(|c| width(&c.0))
        .chain([width(HEADERS[0])])
        .max()
        .unwrap_or(0);
    let w1 = cells
        .iter()
        .map(|c| width(&c.1))
        .chain([width(HEADERS[1])])
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "{} | {} | {}\n",
        pad(HEADERS[0], w0),
        pad(HEADERS[1], w1),
        HEADERS[2]
    ));
    out.push_str(&format!(
        "{}-+-{}-+-{}\n",
        "-".repeat(w0),
        "-".repeat(w1),
        "-".repeat(width(HEADERS[2]))
    ));

    for (label, count, titles) in &cells {
        for (i, line) in titles.lines().enumerate() {
            let (first, second) = if i == 0 {
                (label.as_str(), count.as_str())
            } else {
                ("", "")
            };
            out.push_str(&format!("{} | {} | {}\n", pad(first, w0), pad(second, w1), line));
        }
    }
    out
}
