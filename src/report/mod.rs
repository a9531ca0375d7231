//! Views and renderers for catalog grids, score matrices and summaries.

mod export;
mod text;
pub mod views;

pub use export::write_matrix_csv;
pub use text::{render_matrix, render_record_summary};
pub use views::{GroupSummaryView, MatrixView, RecordSummaryView, ScoreCell, ScoreLineView};
