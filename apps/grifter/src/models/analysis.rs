use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;

const DEFAULT_ANALYZE_ERROR: &str = "Failed to analyze resume";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
    Error,
}

/// Output of `POST /api/analyze-resume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: AnalysisStatus,
    #[serde(default)]
    pub analysis: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl AnalysisResponse {
    /// Returns the analysis as text, or a `Service` error for a non-success status.
    ///
    /// String payloads are returned as-is (narrative or JSON-encoded); object
    /// payloads are re-encoded so that every success is stored the same way.
    pub fn into_text(self) -> Result<String, AppError> {
        if self.status != AnalysisStatus::Success {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ANALYZE_ERROR.to_string());
            return Err(AppError::Service(message));
        }
        match self.analysis {
            Value::String(text) => Ok(text),
            Value::Null => Err(AppError::Parse("analysis field is missing".to_string())),
            other => Ok(other.to_string()),
        }
    }
}

/// A repository file the analysis looked at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSample {
    pub file_path: String,
    pub file_url: String,
}

/// Verdict for a single claimed project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub name: String,
    /// Ordered prose segments. Only the last one may carry the Grift Rating.
    #[serde(default, deserialize_with = "one_or_many")]
    pub analysis: Vec<String>,
    #[serde(default)]
    pub code_samples: Vec<CodeSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsAnalysis {
    pub projects: Vec<ProjectAnalysis>,
}

/// The two payload shapes the analysis service has produced, behind one entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisBody {
    Projects(Vec<ProjectAnalysis>),
    Narrative(String),
}

impl AnalysisBody {
    /// Classifies stored analysis text.
    ///
    /// - JSON object with `projects` → `Projects` (malformed list is a `Parse` error)
    /// - JSON object shaped like a single project (the backend's "links missing" fallback)
    ///   → `Projects` with one entry
    /// - JSON string → classified recursively (double-encoded payloads)
    /// - anything that is not JSON → `Narrative`
    pub fn from_text(text: &str) -> Result<Self, AppError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Self::from_object(Value::Object(map)),
            Ok(Value::String(inner)) => Self::from_text(&inner),
            Ok(_) | Err(_) => Ok(AnalysisBody::Narrative(text.to_string())),
        }
    }

    fn from_object(value: Value) -> Result<Self, AppError> {
        if value.get("projects").is_some() {
            let parsed: ProjectsAnalysis = serde_json::from_value(value)?;
            return Ok(AnalysisBody::Projects(parsed.projects));
        }
        if value.get("name").is_some() && value.get("analysis").is_some() {
            let project: ProjectAnalysis = serde_json::from_value(value)?;
            return Ok(AnalysisBody::Projects(vec![project]));
        }
        Err(AppError::Parse(
            "analysis object has neither `projects` nor a project shape".to_string(),
        ))
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECTS_JSON: &str = r#"{
        "projects": [
            {
                "name": "rusty-cache",
                "analysis": ["Looks legit.\n### Grift Rating: 2/10"],
                "code_samples": [
                    {"file_path": "src/lib.rs", "file_url": "https://github.com/a/rusty-cache/blob/main/src/lib.rs"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_success_string_analysis_is_returned_verbatim() {
        let resp: AnalysisResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "analysis": PROJECTS_JSON,
        }))
        .unwrap();
        assert_eq!(resp.into_text().unwrap(), PROJECTS_JSON);
    }

    #[test]
    fn test_success_object_analysis_is_reencoded() {
        let resp: AnalysisResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "analysis": {"projects": []},
        }))
        .unwrap();
        let text = resp.into_text().unwrap();
        assert_eq!(
            AnalysisBody::from_text(&text).unwrap(),
            AnalysisBody::Projects(vec![])
        );
    }

    #[test]
    fn test_error_status_uses_message_or_default() {
        let resp: AnalysisResponse =
            serde_json::from_str(r#"{"status": "error", "message": "GitHub rate limit"}"#).unwrap();
        assert!(matches!(resp.into_text(), Err(AppError::Service(m)) if m == "GitHub rate limit"));

        let resp: AnalysisResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(
            matches!(resp.into_text(), Err(AppError::Service(m)) if m == "Failed to analyze resume")
        );
    }

    #[test]
    fn test_success_without_analysis_is_parse_error() {
        let resp: AnalysisResponse = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert!(matches!(resp.into_text(), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_body_from_projects_json() {
        let body = AnalysisBody::from_text(PROJECTS_JSON).unwrap();
        let AnalysisBody::Projects(projects) = body else {
            panic!("expected projects body");
        };
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "rusty-cache");
        assert_eq!(projects[0].code_samples[0].file_path, "src/lib.rs");
    }

    #[test]
    fn test_body_from_narrative() {
        let text = "This candidate is a legend.\nGrift Rating: 1/10";
        assert_eq!(
            AnalysisBody::from_text(text).unwrap(),
            AnalysisBody::Narrative(text.to_string())
        );
    }

    #[test]
    fn test_body_from_bare_json_number_is_narrative() {
        assert_eq!(
            AnalysisBody::from_text("42").unwrap(),
            AnalysisBody::Narrative("42".to_string())
        );
    }

    #[test]
    fn test_body_from_single_project_fallback() {
        let text = r#"{"name": "None", "analysis": "Could not find all links", "code_samples": []}"#;
        let AnalysisBody::Projects(projects) = AnalysisBody::from_text(text).unwrap() else {
            panic!("expected projects body");
        };
        assert_eq!(projects[0].analysis, vec!["Could not find all links".to_string()]);
    }

    #[test]
    fn test_body_from_double_encoded_json() {
        let encoded = serde_json::to_string(PROJECTS_JSON).unwrap();
        assert!(matches!(
            AnalysisBody::from_text(&encoded).unwrap(),
            AnalysisBody::Projects(p) if p.len() == 1
        ));
    }

    #[test]
    fn test_body_with_malformed_projects_is_parse_error() {
        assert!(matches!(
            AnalysisBody::from_text(r#"{"projects": "nope"}"#),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            AnalysisBody::from_text(r#"{"unexpected": true}"#),
            Err(AppError::Parse(_))
        ));
    }
}
