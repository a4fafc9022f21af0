pub mod analysis;
pub mod resume;

pub use analysis::AnalysisResponse;
pub use resume::ParsedResume;
