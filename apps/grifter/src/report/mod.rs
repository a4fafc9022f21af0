// Report pipeline: analysis text → segments/ratings → project model → display tree.
// Nothing in here performs I/O.

pub mod model;
pub mod parser;
pub mod render;

pub use model::ProjectReportModel;
pub use render::{render_body, render_report, ReportView};
