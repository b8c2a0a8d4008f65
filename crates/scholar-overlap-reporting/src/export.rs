use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use scholar_overlap_core::ComparisonRow;

use crate::HEADERS;
use crate::table::titles_cell;
use crate::types::ExportFormat;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render comparison rows in the given format.
pub fn render_rows(rows: &[ComparisonRow], format: ExportFormat) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::Csv => export_csv(rows),
        ExportFormat::Json => export_json(rows)?,
        ExportFormat::Markdown => export_markdown(rows),
        ExportFormat::Text => export_text(rows),
    })
}

/// Export comparison rows to the given path.
pub fn export_rows(
    rows: &[ComparisonRow],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let content = render_rows(rows, format)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn export_csv(rows: &[ComparisonRow]) -> String {
    let mut out = format!("{}\n", HEADERS.join(","));
    for row in rows {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_escape(&row.label),
            row.count,
            csv_escape(&titles_cell(row))
        ));
    }
    out
}

#[derive(Serialize)]
struct JsonRow<'a> {
    files_compared: &'a str,
    common_publications: usize,
    titles: &'a [String],
}

fn export_json(rows: &[ComparisonRow]) -> Result<String, serde_json::Error> {
    let json_rows: Vec<JsonRow<'_>> = rows
        .iter()
        .map(|r| JsonRow {
            files_compared: &r.label,
            common_publications: r.count,
            titles: &r.titles,
        })
        .collect();
    let mut out = serde_json::to_string_pretty(&json_rows)?;
    out.push('\n');
    Ok(out)
}

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

fn export_markdown(rows: &[ComparisonRow]) -> String {
    let mut out = String::from("# Publication Comparisons\n\n");
    out.push_str(&format!("| {} |\n", HEADERS.join(" | ")));
    out.push_str("|---|---|---|\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            md_escape(&row.label),
            row.count,
            md_escape(&titles_cell(row)).replace('\n', "<br>")
        ));
    }
    out
}

fn export_text(rows: &[ComparisonRow]) -> String {
    let mut out = String::from("Publication Comparisons\n=======================\n");
    for row in rows {
        out.push_str(&format!(
            "\n{}\n{}: {}\n{}\n",
            row.label,
            HEADERS[1],
            row.count,
            titles_cell(row)
        ));
    }
    out
}
