use serde::{Deserialize, Serialize};

/// A titled block of résumé content. The section list is flat and ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSection {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Filled in by the suggestion pass; absent until generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
}

impl ResumeSection {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            suggestions: None,
        }
    }
}

/// Text extracted from an upload. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResumeText(String);

impl RawResumeText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Empty summary/experience/education/skills sections, used when a session
/// has neither a usable section blob nor raw text to re-parse.
pub fn default_sections() -> Vec<ResumeSection> {
    vec![
        ResumeSection::new("summary", "Professional Summary", ""),
        ResumeSection::new("experience", "Work Experience", ""),
        ResumeSection::new("education", "Education", ""),
        ResumeSection::new("skills", "Skills", ""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_omitted_when_absent() {
        let section = ResumeSection::new("skills", "Skills", "Rust, SQL");
        let json = serde_json::to_value(&section).unwrap();
        assert!(json.get("suggestions").is_none());
    }

    #[test]
    fn test_section_deserializes_without_suggestions_field() {
        let json = r#"{"id": "summary", "title": "Summary", "content": "Built things."}"#;
        let section: ResumeSection = serde_json::from_str(json).unwrap();
        assert_eq!(section.id, "summary");
        assert!(section.suggestions.is_none());
    }

    #[test]
    fn test_default_sections_have_unique_ids() {
        let sections = default_sections();
        let ids: std::collections::HashSet<_> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), sections.len());
        assert!(sections.iter().all(|s| s.content.is_empty()));
    }
}
