use std::io::Write;

use owo_colors::OwoColorize;
use scholar_overlap_core::{ComparisonRow, ExtractedTitles, RecencyFilter};
use scholar_overlap_ingest::{IngestError, IngestIssue, IngestedDocument};
use scholar_overlap_reporting::render_table;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

pub const NOT_ENOUGH_RECORDS: &str =
    "Upload at least 2 valid Google Scholar PDFs to compare publications.";

fn warning(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), message)
    } else {
        writeln!(w, "WARNING: {}", message)
    }
}

/// Print one line per skipped item, plus archive notices.
pub fn print_issues(
    w: &mut dyn Write,
    issues: &[IngestIssue],
    notices: &[String],
    color: ColorMode,
) -> std::io::Result<()> {
    for issue in issues {
        let message = match &issue.error {
            IngestError::FormatMismatch { marker } => format!(
                "Skipping {}: Not detected as a {} PDF.",
                issue.name, marker
            ),
            other => format!("Skipping {}: {}", issue.name, other),
        };
        warning(w, &message, color)?;
    }
    for notice in notices {
        warning(w, notice, color)?;
    }
    if !issues.is_empty() || !notices.is_empty() {
        writeln!(w)?;
    }
    Ok(())
}

/// Print how many titles each accepted document contributed.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    documents: &[IngestedDocument],
    color: ColorMode,
) -> std::io::Result<()> {
    for doc in documents {
        let name = if color.enabled() {
            doc.name.bold().to_string()
        } else {
            doc.name.clone()
        };
        write!(
            w,
            "{}: {} titles from {} pages",
            name,
            doc.titles.len(),
            doc.page_count
        )?;
        if doc.record.len() != doc.titles.len() {
            write!(w, " ({} recent)", doc.record.len())?;
        }
        writeln!(w)?;
    }
    writeln!(w)?;
    Ok(())
}

pub fn print_not_enough(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    warning(w, NOT_ENOUGH_RECORDS, color)
}

/// Print the comparison table.
pub fn print_comparison(
    w: &mut dyn Write,
    rows: &[ComparisonRow],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", "Publication Comparisons".bold().cyan())?;
    } else {
        writeln!(w, "Publication Comparisons")?;
    }
    writeln!(w)?;

    let table = render_table(rows);
    for (i, line) in table.lines().enumerate() {
        if color.enabled() && i == 0 {
            writeln!(w, "{}", line.bold())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    Ok(())
}

/// Dry-run listing: detection verdict and every extracted title.
#[allow(clippy::too_many_arguments)]
pub fn print_dry_run(
    w: &mut dyn Write,
    name: &str,
    page_count: usize,
    marker: &str,
    detected: bool,
    titles: &ExtractedTitles,
    recency: Option<&RecencyFilter>,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} pages)\n",
            "DRY RUN:".bold().cyan(),
            name.bold(),
            page_count
        )?;
    } else {
        writeln!(w, "DRY RUN: {} ({} pages)\n", name, page_count)?;
    }

    let verdict = if detected {
        format!("{} PDF detected", marker)
    } else {
        format!("NOT detected as a {} PDF", marker)
    };
    if color.enabled() {
        if detected {
            writeln!(w, "Format: {}", verdict.green())?;
        } else {
            writeln!(w, "Format: {}", verdict.red())?;
        }
    } else {
        writeln!(w, "Format: {}", verdict)?;
    }

    writeln!(
        w,
        "Found {} titles ({} with years)\n",
        titles.len(),
        titles.dated_count()
    )?;

    for (i, (title, year)) in titles.iter().enumerate() {
        let year_str = year.map(|y| format!(" [{}]", y)).unwrap_or_default();
        write!(w, "{:>4}. {}{}", i + 1, title, year_str)?;
        if let Some(filter) = recency
            && !filter.retains(year)
        {
            let note = format!(" (excluded: before {})", filter.min_year());
            if color.enabled() {
                write!(w, "{}", note.dimmed())?;
            } else {
                write!(w, "{}", note)?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}
