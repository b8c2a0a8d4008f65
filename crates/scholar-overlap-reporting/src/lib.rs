pub mod export;
pub mod table;
pub mod types;

pub use export::{ExportError, export_rows, render_rows};
pub use table::{render_table, titles_cell};
pub use types::ExportFormat;

/// Column headers shared by every tabular format.
pub const HEADERS: [&str; 3] = ["Files Compared", "Common Publications", "Titles"];
