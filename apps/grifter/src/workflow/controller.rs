//! Workflow controller: drives upload → parse → (conditional) scrape → analyze → display.
//!
//! Flow: validate_upload → parse_resume → branch on found_all_links/username →
//!       analyze_resume → Done (+ 3 s completion banner).
//!
//! One controller owns one session. Every transition that follows an await is
//! tagged with the epoch captured when the session started; `reset()` bumps the
//! epoch, so a response that lands after a reset is dropped instead of applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api_client::{ResumeApi, ResumeUpload};
use crate::errors::AppError;
use crate::models::{AnalysisResponse, ParsedResume};
use crate::workflow::state::{
    WorkflowState, WorkflowView, BANNER_DURATION, COMPLETION_BANNER, MSG_ANALYZE_FAILED, MSG_BUSY,
    MSG_PARSE_FAILED, NOTICE_NO_LINKS, STATUS_LOOKING, STATUS_SCRAPING,
};
use crate::workflow::upload::validate_upload;

struct Session {
    view: WorkflowView,
    parsed_resume: Option<ParsedResume>,
    banner_task: Option<AbortHandle>,
}

impl Session {
    fn new() -> Self {
        Self {
            view: WorkflowView::idle(Uuid::new_v4(), 0),
            parsed_resume: None,
            banner_task: None,
        }
    }

    fn enter(&mut self, state: WorkflowState) {
        self.view.state = state;
        self.view.transitions.push(state);
    }

    /// Starts a fresh epoch with no carryover from the previous session.
    fn restart(&mut self) {
        if let Some(task) = self.banner_task.take() {
            task.abort();
        }
        self.view = WorkflowView::idle(Uuid::new_v4(), self.view.epoch + 1);
        self.parsed_resume = None;
    }
}

struct Shared {
    session: Mutex<Session>,
    views: watch::Sender<WorkflowView>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.views.send_replace(session.view.clone());
    }

    /// Applies `f` if `epoch` is still the live session. Returns false for a stale epoch.
    fn update(&self, epoch: u64, f: impl FnOnce(&mut Session)) -> bool {
        let mut session = self.lock();
        if session.view.epoch != epoch {
            debug!(
                "Discarding update for stale epoch {epoch} (current {})",
                session.view.epoch
            );
            return false;
        }
        f(&mut *session);
        self.publish(&session);
        true
    }

    fn transition(&self, epoch: u64, state: WorkflowState, f: impl FnOnce(&mut Session)) -> bool {
        self.update(epoch, |session| {
            session.enter(state);
            f(session);
        })
    }
}

/// Owns the verification session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct WorkflowController {
    api: Arc<dyn ResumeApi>,
    shared: Arc<Shared>,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn ResumeApi>) -> Self {
        let session = Session::new();
        let (views, _) = watch::channel(session.view.clone());
        Self {
            api,
            shared: Arc::new(Shared {
                session: Mutex::new(session),
                views,
            }),
        }
    }

    /// Receives a snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowView> {
        self.shared.views.subscribe()
    }

    pub fn view(&self) -> WorkflowView {
        self.shared.lock().view.clone()
    }

    pub fn parsed_resume(&self) -> Option<ParsedResume> {
        self.shared.lock().parsed_resume.clone()
    }

    /// Returns to `Idle` from any state and clears every piece of session data.
    /// An in-flight request keeps running, but its result is discarded.
    pub fn reset(&self) {
        let mut session = self.shared.lock();
        let previous = session.view.state;
        session.restart();
        info!(
            epoch = session.view.epoch,
            "Session reset from {previous:?}"
        );
        if previous.is_in_flight() {
            debug!("Pending response from the previous session will be ignored");
        }
        self.shared.publish(&session);
    }

    /// Runs the whole workflow for one résumé and returns the resulting view.
    ///
    /// Only accepted from `Idle` or `Error` (the latter implies a reset). While a
    /// previous upload is in flight or a report is shown, returns `Validation`.
    pub async fn submit(&self, upload: ResumeUpload) -> Result<WorkflowView, AppError> {
        let (epoch, session_id) = {
            let mut session = self.shared.lock();
            if !session.view.state.accepts_upload() {
                warn!(
                    "Rejecting upload of {} while {:?}",
                    upload.file_name, session.view.state
                );
                return Err(AppError::Validation(MSG_BUSY.to_string()));
            }
            session.restart();
            session.view.file_name = Some(upload.file_name.clone());
            session.view.status = Some(format!("Uploading {}...", upload.file_name));
            session.enter(WorkflowState::Uploading);
            self.shared.publish(&session);
            (session.view.epoch, session.view.session_id)
        };

        let span = info_span!("session", id = %session_id, epoch, file = %upload.file_name);
        self.run(epoch, upload).instrument(span).await;
        Ok(self.view())
    }

    async fn run(&self, epoch: u64, upload: ResumeUpload) {
        if let Err(err) = validate_upload(&upload.file_name, upload.bytes.len() as u64) {
            warn!("Upload rejected locally: {err}");
            self.fail(epoch, err.user_message(), true);
            return;
        }

        let status = format!("Parsing {}...", upload.file_name);
        if !self
            .shared
            .transition(epoch, WorkflowState::ParsingResume, |s| {
                s.view.status = Some(status)
            })
        {
            return;
        }

        info!("Parsing resume ({} bytes)", upload.bytes.len());
        let parsed = match self.api.parse_resume(&upload).await {
            Ok(parsed) => parsed,
            Err(err) => {
                let err = AppError::from(err);
                warn!("Resume parsing failed: {err}");
                self.fail(epoch, parse_failure_message(&err), true);
                return;
            }
        };

        let stored = parsed.clone();
        if !self.shared.update(epoch, |s| s.parsed_resume = Some(stored)) {
            return;
        }

        let (state, status, notice) = if parsed.found_all_links {
            (WorkflowState::AnalyzingDirect, STATUS_LOOKING, None)
        } else if parsed.github_username().is_some() {
            info!("No project links on resume; scraping GitHub profile instead");
            (
                WorkflowState::LinkDiscoveryIncomplete,
                STATUS_SCRAPING,
                Some(NOTICE_NO_LINKS),
            )
        } else {
            warn!("Resume has neither project links nor a GitHub username");
            self.fail(epoch, AppError::LinkDiscovery.user_message(), false);
            return;
        };

        if !self.shared.transition(epoch, state, |s| {
            s.view.status = Some(status.to_string());
            s.view.notice = notice.map(str::to_string);
        }) {
            return;
        }
        if !self
            .shared
            .transition(epoch, WorkflowState::Analyzing, |_| {})
        {
            return;
        }

        info!(
            found_all_links = parsed.found_all_links,
            projects = parsed.projects.len(),
            "Analyzing resume"
        );
        let result = self
            .api
            .analyze_resume(&parsed)
            .await
            .map_err(AppError::from)
            .and_then(AnalysisResponse::into_text);

        match result {
            Ok(text) => self.complete(epoch, text),
            Err(err) => {
                warn!("Resume analysis failed: {err}");
                self.fail(epoch, analyze_failure_message(&err), false);
            }
        }
    }

    fn complete(&self, epoch: u64, text: String) {
        let shared = Arc::clone(&self.shared);
        let applied = self.shared.transition(epoch, WorkflowState::Done, move |s| {
            s.view.analysis_text = Some(text);
            s.view.status = None;
            s.view.notice = None;
            s.view.completion_banner = Some(COMPLETION_BANNER.to_string());
            s.view.completed_at = Some(Utc::now());

            let task = tokio::spawn(async move {
                tokio::time::sleep(BANNER_DURATION).await;
                shared.update(epoch, |s| {
                    s.view.completion_banner = None;
                    s.banner_task = None;
                });
            });
            s.banner_task = Some(task.abort_handle());
        });
        if applied {
            info!("Analysis complete");
        }
    }

    fn fail(&self, epoch: u64, message: String, clear_file: bool) {
        self.shared.transition(epoch, WorkflowState::Error, |s| {
            s.view.error = Some(message);
            s.view.status = None;
            s.view.notice = None;
            s.view.completion_banner = None;
            if clear_file {
                s.view.file_name = None;
            }
        });
    }
}

fn parse_failure_message(err: &AppError) -> String {
    match err {
        AppError::Network(_) => err.user_message(),
        AppError::Service(message) if !message.trim().is_empty() => message.clone(),
        _ => MSG_PARSE_FAILED.to_string(),
    }
}

fn analyze_failure_message(err: &AppError) -> String {
    match err {
        AppError::Service(message) if !message.trim().is_empty() => message.clone(),
        _ => MSG_ANALYZE_FAILED.to_string(),
    }
}
