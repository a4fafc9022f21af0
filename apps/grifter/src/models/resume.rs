use serde::{Deserialize, Serialize};

/// A project claimed on the résumé, as extracted by the parsing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

/// Output of `POST /api/get-parsed-resume`.
/// Sent back verbatim as the body of `POST /api/analyze-resume`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub found_all_links: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub github_username: String,
    #[serde(default)]
    pub projects: Vec<ProjectRef>,
}

impl ParsedResume {
    /// The recovered GitHub username, if any non-blank one was found.
    pub fn github_username(&self) -> Option<&str> {
        let name = self.github_username.trim();
        (!name.is_empty()).then_some(name)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_resume_deserializes_backend_shape() {
        let json = r#"{
            "found_all_links": true,
            "github_username": "octocat",
            "projects": [
                {"name": "Spoon-Knife", "description": "Fork demo", "url": "https://github.com/octocat/Spoon-Knife"}
            ]
        }"#;
        let parsed: ParsedResume = serde_json::from_str(json).unwrap();
        assert!(parsed.found_all_links);
        assert_eq!(parsed.github_username(), Some("octocat"));
        assert_eq!(parsed.projects.len(), 1);
        assert_eq!(parsed.projects[0].url, "https://github.com/octocat/Spoon-Knife");
    }

    #[test]
    fn test_missing_and_null_username_are_empty() {
        let parsed: ParsedResume = serde_json::from_str(r#"{"found_all_links": false}"#).unwrap();
        assert_eq!(parsed.github_username(), None);
        assert!(parsed.projects.is_empty());

        let parsed: ParsedResume =
            serde_json::from_str(r#"{"found_all_links": false, "github_username": null}"#).unwrap();
        assert_eq!(parsed.github_username(), None);
    }

    #[test]
    fn test_blank_username_is_not_a_username() {
        let parsed = ParsedResume {
            github_username: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(parsed.github_username(), None);
    }

    #[test]
    fn test_serializes_snake_case_for_analyze_call() {
        let parsed = ParsedResume {
            found_all_links: false,
            github_username: "octocat".to_string(),
            projects: vec![],
        };
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["found_all_links"], false);
        assert_eq!(value["github_username"], "octocat");
        assert!(value["projects"].as_array().unwrap().is_empty());
    }
}
