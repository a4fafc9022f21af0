use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const STATUS_LOOKING: &str = "Looking at GitHub...";
pub const STATUS_SCRAPING: &str = "Scraping GitHub for projects...";
pub const NOTICE_NO_LINKS: &str = "No GitHub project links found on resume, trying anyway...";
pub const COMPLETION_BANNER: &str = "Analysis complete";

pub const MSG_PARSE_FAILED: &str = "Failed to parse resume";
pub const MSG_ANALYZE_FAILED: &str = "Failed to analyze resume";
pub const MSG_BUSY: &str = "A resume is already being analyzed; reset before uploading another";

/// How long the completion banner stays up after `Done`.
pub const BANNER_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Uploading,
    ParsingResume,
    /// Résumé had no project links but a username was found; scraping anyway.
    LinkDiscoveryIncomplete,
    /// Résumé links are complete; going straight to analysis.
    AnalyzingDirect,
    Analyzing,
    Done,
    Error,
}

impl WorkflowState {
    /// Upload surface is only live when nothing is in flight and no report is shown.
    pub fn accepts_upload(self) -> bool {
        matches!(self, WorkflowState::Idle | WorkflowState::Error)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            WorkflowState::Uploading
                | WorkflowState::ParsingResume
                | WorkflowState::LinkDiscoveryIncomplete
                | WorkflowState::AnalyzingDirect
                | WorkflowState::Analyzing
        )
    }
}

/// Read-only snapshot of the session, published on every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowView {
    pub session_id: Uuid,
    pub epoch: u64,
    pub state: WorkflowState,
    pub file_name: Option<String>,
    /// Loading line, e.g. "Looking at GitHub...".
    pub status: Option<String>,
    /// Transient notice that may sit next to the loading indicator.
    pub notice: Option<String>,
    pub error: Option<String>,
    pub analysis_text: Option<String>,
    pub completion_banner: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    /// States visited since the session started, oldest first.
    pub transitions: Vec<WorkflowState>,
}

impl WorkflowView {
    pub fn idle(session_id: Uuid, epoch: u64) -> Self {
        Self {
            session_id,
            epoch,
            state: WorkflowState::Idle,
            file_name: None,
            status: None,
            notice: None,
            error: None,
            analysis_text: None,
            completion_banner: None,
            completed_at: None,
            transitions: vec![WorkflowState::Idle],
        }
    }
}
