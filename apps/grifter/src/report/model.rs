use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::analysis::{AnalysisBody, ProjectAnalysis};
use crate::report::parser::{extract_rating, parse, Rating, Segment};

/// Loaded project verdicts plus which one (if any) is expanded.
#[derive(Debug, Clone, Default)]
pub struct ProjectReportModel {
    projects: Vec<ProjectAnalysis>,
    expanded: Option<usize>,
}

/// Parsed form of one analysis string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub segments: Vec<Segment>,
}

/// Everything the renderer needs for the expanded project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedProjectView<'a> {
    pub index: usize,
    pub project: &'a ProjectAnalysis,
    pub sections: Vec<SectionView>,
    /// Rating taken from the final analysis string only.
    pub rating: Option<Rating>,
}

impl ProjectReportModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads any project-shaped payload `AnalysisBody::from_text` accepts.
    /// Narrative text is not a project report and is a `Parse` error.
    /// On failure the previously loaded report is left untouched.
    pub fn load(&mut self, payload: &str) -> Result<&[ProjectAnalysis], AppError> {
        let body = AnalysisBody::from_text(payload).map_err(|e| {
            warn!("Failed to parse analysis data: {e}");
            e
        })?;
        match body {
            AnalysisBody::Projects(projects) => Ok(self.load_projects(projects)),
            AnalysisBody::Narrative(_) => {
                warn!("Analysis data is narrative text, not a project list");
                Err(AppError::Parse(
                    "analysis data is not a project list".to_string(),
                ))
            }
        }
    }

    /// Replaces the report; the first project starts expanded.
    pub fn load_projects(&mut self, projects: Vec<ProjectAnalysis>) -> &[ProjectAnalysis] {
        self.expanded = if projects.is_empty() { None } else { Some(0) };
        self.projects = projects;
        debug!("Loaded report with {} projects", self.projects.len());
        &self.projects
    }

    pub fn projects(&self) -> &[ProjectAnalysis] {
        &self.projects
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    /// Collapses `index` if it is expanded, otherwise makes it the only expanded project.
    pub fn toggle_expanded(&mut self, index: usize) {
        if index >= self.projects.len() {
            warn!(
                "Ignoring toggle of project {index}; report has {}",
                self.projects.len()
            );
            return;
        }
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn expanded_view(&self) -> Option<ExpandedProjectView<'_>> {
        let index = self.expanded?;
        let project = self.projects.get(index)?;
        Some(ExpandedProjectView {
            index,
            project,
            sections: project
                .analysis
                .iter()
                .map(|text| SectionView {
                    segments: parse(text),
                })
                .collect(),
            rating: project.analysis.last().and_then(|text| extract_rating(text)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PROJECTS: &str = r#"{
        "projects": [
            {
                "name": "todo-app",
                "analysis": [
                    "Grift Rating: 9/10 appears early but must be ignored",
                    "Intro\n```js\nconsole.log('hi')\n```",
                    "Verdict.\n### Grift Rating: 3/10"
                ],
                "code_samples": [{"file_path": "app.js", "file_url": "https://github.com/u/todo-app/blob/main/app.js"}]
            },
            {
                "name": "blockchain-ai",
                "analysis": ["Grift Rating: 10/10", "Nothing to see."],
                "code_samples": []
            }
        ]
    }"#;

    #[test]
    fn test_load_empty_projects_has_no_expansion() {
        let mut model = ProjectReportModel::new();
        assert!(model.load(r#"{"projects":[]}"#).unwrap().is_empty());
        assert_eq!(model.expanded(), None);
        assert!(model.expanded_view().is_none());
    }

    #[test]
    fn test_load_expands_first_project() {
        let mut model = ProjectReportModel::new();
        assert_eq!(model.load(TWO_PROJECTS).unwrap().len(), 2);
        assert_eq!(model.expanded(), Some(0));
    }

    #[test]
    fn test_bad_json_keeps_previous_report() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        model.toggle_expanded(1);

        assert!(matches!(model.load("not json"), Err(AppError::Parse(_))));
        assert!(matches!(model.load(r#"{"items": []}"#), Err(AppError::Parse(_))));
        assert_eq!(model.projects().len(), 2);
        assert_eq!(model.expanded(), Some(1));
    }

    #[test]
    fn test_load_accepts_single_project_fallback() {
        let mut model = ProjectReportModel::new();
        let projects = model
            .load(r#"{"name":"None","analysis":"Could not find all links","code_samples":[]}"#)
            .unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].analysis, vec!["Could not find all links".to_string()]);
        assert_eq!(model.expanded(), Some(0));
    }

    #[test]
    fn test_load_accepts_double_encoded_payload() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        assert!(model.load(r#""{\"projects\": []}""#).unwrap().is_empty());
        assert_eq!(model.expanded(), None);
    }

    #[test]
    fn test_narrative_text_is_rejected_and_keeps_report() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();

        assert!(matches!(
            model.load("Looks real. Grift Rating: 2/10"),
            Err(AppError::Parse(_))
        ));
        assert_eq!(model.projects().len(), 2);
        assert_eq!(model.expanded(), Some(0));
    }

    #[test]
    fn test_toggle_twice_collapses() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        model.toggle_expanded(0);
        assert_eq!(model.expanded(), None);
        model.toggle_expanded(0);
        assert_eq!(model.expanded(), Some(0));
        model.toggle_expanded(0);
        assert_eq!(model.expanded(), None);
    }

    #[test]
    fn test_toggle_other_project_moves_expansion() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        model.toggle_expanded(1);
        assert_eq!(model.expanded(), Some(1));
    }

    #[test]
    fn test_toggle_out_of_range_is_ignored() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        model.toggle_expanded(7);
        assert_eq!(model.expanded(), Some(0));
    }

    #[test]
    fn test_expanded_view_rates_last_segment_only() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();

        let view = model.expanded_view().unwrap();
        assert_eq!(view.project.name, "todo-app");
        assert_eq!(view.sections.len(), 3);
        assert_eq!(view.sections[1].segments.len(), 2);
        assert_eq!(view.rating.map(|r| r.value), Some(3.0));
    }

    #[test]
    fn test_early_rating_is_not_used_when_last_has_none() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        model.toggle_expanded(1);

        let view = model.expanded_view().unwrap();
        assert_eq!(view.project.name, "blockchain-ai");
        assert!(view.rating.is_none());
    }

    #[test]
    fn test_view_does_not_mutate_analysis() {
        let mut model = ProjectReportModel::new();
        model.load(TWO_PROJECTS).unwrap();
        let before = model.projects().to_vec();
        let _ = model.expanded_view();
        assert_eq!(model.projects(), before.as_slice());
    }
}
