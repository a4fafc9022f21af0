//! Report renderer: turns a loaded report into a display tree.
//!
//! Rendering is a pure function of the model: no I/O, no state of its own.
//! `ReportView` serializes for `--json` and implements `Display` for the terminal.

use std::fmt;

use reqwest::Url;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::analysis::{AnalysisBody, ProjectAnalysis};
use crate::report::model::{ProjectReportModel, SectionView};
use crate::report::parser::{extract_rating, parse, Rating, Segment, Severity};

pub const EMPTY_REPORT_MESSAGE: &str = "No projects to analyze.";
const GAUGE_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportView {
    Empty { message: String },
    Projects { cards: Vec<ProjectCard> },
    Narrative { body: CardBody },
}

/// One collapsible card per project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCard {
    pub title: String,
    pub badge: String,
    pub expanded: bool,
    pub body: Option<CardBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardBody {
    pub files: Vec<FileLink>,
    pub sections: Vec<SectionView>,
    /// Drawn under the final section only.
    pub gauge: Option<RatingGauge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLink {
    pub label: String,
    pub url: String,
    /// `owner/repo`, when the URL is a GitHub-style repository link.
    pub repository: Option<String>,
    pub opens_new_context: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingGauge {
    pub score: String,
    pub percentage: f64,
    pub severity: Severity,
}

impl From<Rating> for RatingGauge {
    fn from(rating: Rating) -> Self {
        Self {
            score: format!("{}/10", rating.value),
            percentage: rating.percentage,
            severity: rating.severity,
        }
    }
}

/// Renders every project as a card; only the expanded one carries a body.
pub fn render_report(model: &ProjectReportModel) -> ReportView {
    if model.projects().is_empty() {
        return ReportView::Empty {
            message: EMPTY_REPORT_MESSAGE.to_string(),
        };
    }

    let expanded = model.expanded_view();
    let cards = model
        .projects()
        .iter()
        .enumerate()
        .map(|(index, project)| {
            let body = expanded
                .as_ref()
                .filter(|view| view.index == index)
                .map(|view| CardBody {
                    files: file_links(project),
                    sections: view.sections.clone(),
                    gauge: view.rating.map(RatingGauge::from),
                });
            ProjectCard {
                title: project.name.clone(),
                badge: format!("{} code samples", project.code_samples.len()),
                expanded: body.is_some(),
                body,
            }
        })
        .collect();

    ReportView::Projects { cards }
}

/// Renders a single narrative string; it is its own final segment.
pub fn render_narrative(text: &str) -> ReportView {
    ReportView::Narrative {
        body: CardBody {
            files: Vec::new(),
            sections: vec![SectionView {
                segments: parse(text),
            }],
            gauge: extract_rating(text).map(RatingGauge::from),
        },
    }
}

/// Renders analysis text of either shape. Project payloads are loaded into `model`
/// through `ProjectReportModel::load`; a failed load leaves `model` untouched.
pub fn render_body(text: &str, model: &mut ProjectReportModel) -> Result<ReportView, AppError> {
    match AnalysisBody::from_text(text)? {
        AnalysisBody::Narrative(narrative) => Ok(render_narrative(&narrative)),
        AnalysisBody::Projects(_) => {
            model.load(text)?;
            Ok(render_report(model))
        }
    }
}

fn file_links(project: &ProjectAnalysis) -> Vec<FileLink> {
    project
        .code_samples
        .iter()
        .map(|sample| FileLink {
            label: sample.file_path.clone(),
            url: sample.file_url.clone(),
            repository: repository_slug(&sample.file_url),
            opens_new_context: true,
        })
        .collect()
}

/// `https://github.com/owner/repo/blob/...` → `owner/repo`.
pub fn repository_slug(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut parts = parsed.path_segments()?.filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    Some(format!("{owner}/{repo}"))
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportView::Empty { message } => writeln!(f, "{message}"),
            ReportView::Projects { cards } => {
                for card in cards {
                    write!(f, "{card}")?;
                }
                Ok(())
            }
            ReportView::Narrative { body } => write!(f, "{body}"),
        }
    }
}

impl fmt::Display for ProjectCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.expanded { "▼" } else { "▶" };
        writeln!(f, "{marker} {}  [{}]", self.title, self.badge)?;
        if let Some(body) = &self.body {
            write!(f, "{body}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for CardBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.files.is_empty() {
            writeln!(f, "  Repository Files")?;
            for link in &self.files {
                match &link.repository {
                    Some(repo) => writeln!(f, "    - {} ({repo})  {}", link.label, link.url)?,
                    None => writeln!(f, "    - {}  {}", link.label, link.url)?,
                }
            }
            writeln!(f)?;
        }

        for section in &self.sections {
            for segment in &section.segments {
                write_segment(f, segment)?;
            }
            writeln!(f)?;
        }

        if let Some(gauge) = &self.gauge {
            write!(f, "{gauge}")?;
        }
        Ok(())
    }
}

fn write_segment(f: &mut fmt::Formatter<'_>, segment: &Segment) -> fmt::Result {
    match segment {
        Segment::Prose { text } => {
            for line in text.trim_matches('\n').lines() {
                writeln!(f, "  {line}")?;
            }
        }
        Segment::CodeBlock { language, code } => {
            writeln!(f, "  ┌─ {language}")?;
            for line in code.lines() {
                writeln!(f, "  │ {line}")?;
            }
            writeln!(f, "  └─")?;
        }
    }
    Ok(())
}

impl fmt::Display for RatingGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = ((self.percentage / 100.0) * GAUGE_WIDTH as f64).round() as usize;
        let filled = filled.min(GAUGE_WIDTH);
        let label = match self.severity {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        writeln!(f, "  Grift Rating: {}", self.score)?;
        writeln!(
            f,
            "  [{}{}] {label}",
            "█".repeat(filled),
            "·".repeat(GAUGE_WIDTH - filled)
        )
    }
}
