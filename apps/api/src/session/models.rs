use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::sections::{default_sections, parse_resume_text, RawResumeText, ResumeSection};

/// Where a session without an uploaded résumé is sent back to.
pub const UPLOAD_PATH: &str = "/upload";
pub const JOB_DESCRIPTION_PATH: &str = "/job-description";
pub const EDITOR_PATH: &str = "/editor";
pub const TEMPLATES_PATH: &str = "/templates";

/// The four persisted string slots of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    ResumeFileName,
    ResumeText,
    ResumeSections,
    JobDescription,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::ResumeFileName,
        Slot::ResumeText,
        Slot::ResumeSections,
        Slot::JobDescription,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Slot::ResumeFileName => "resume_file_name",
            Slot::ResumeText => "resume_text",
            Slot::ResumeSections => "resume_sections",
            Slot::JobDescription => "job_description",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// Slot values exactly as stored. Unknown keys are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSlots(HashMap<Slot, String>);

impl RawSlots {
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    pub fn insert(&mut self, slot: Slot, value: String) {
        self.0.insert(slot, value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_keyed<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self(
            entries
                .into_iter()
                .filter_map(|(key, value)| Slot::from_key(&key).map(|slot| (slot, value)))
                .collect(),
        )
    }
}

/// Pipeline step a session has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Upload,
    JobDescription,
    Editor,
    Templates,
}

impl Stage {
    pub fn path(&self) -> &'static str {
        match self {
            Stage::Upload => UPLOAD_PATH,
            Stage::JobDescription => JOB_DESCRIPTION_PATH,
            Stage::Editor => EDITOR_PATH,
            Stage::Templates => TEMPLATES_PATH,
        }
    }
}

/// A stage was entered without the state it depends on.
#[derive(Debug, Error)]
#[error("{missing} is missing from the session")]
pub struct StageGuardError {
    pub missing: &'static str,
    pub redirect_to: &'static str,
}

/// Typed view over one session's slots.
#[derive(Debug, Clone, PartialEq)]
pub struct TailorSession {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub resume_text: Option<RawResumeText>,
    pub sections: Vec<ResumeSection>,
    pub job_description: Option<String>,
}

impl TailorSession {
    /// A fresh session holding a just-parsed upload.
    pub fn from_upload(file_name: String, resume_text: RawResumeText) -> Self {
        let sections = parse_resume_text(resume_text.as_str());
        Self {
            id: Uuid::new_v4(),
            file_name: Some(file_name),
            resume_text: Some(resume_text),
            sections,
            job_description: None,
        }
    }

    /// Rebuilds a session from stored slots. Never fails: a missing or
    /// malformed section blob is regenerated from the raw text, and when
    /// that is missing too the default empty sections are used.
    pub fn from_slots(id: Uuid, slots: &RawSlots) -> Self {
        let non_blank = |slot| slots.get(slot).filter(|v| !v.trim().is_empty());

        let resume_text = slots.get(Slot::ResumeText).map(RawResumeText::new);
        let sections = match slots.get(Slot::ResumeSections) {
            Some(blob) => match serde_json::from_str::<Vec<ResumeSection>>(blob) {
                Ok(sections) => Some(sections),
                Err(e) => {
                    warn!(session_id = %id, "Stored sections are malformed, re-parsing: {e}");
                    None
                }
            },
            None => None,
        };
        let sections = sections.unwrap_or_else(|| {
            let reparsed = resume_text
                .as_ref()
                .map(|text| parse_resume_text(text.as_str()))
                .unwrap_or_default();
            if reparsed.is_empty() {
                default_sections()
            } else {
                reparsed
            }
        });

        Self {
            id,
            file_name: non_blank(Slot::ResumeFileName).map(String::from),
            resume_text,
            sections,
            job_description: non_blank(Slot::JobDescription).map(String::from),
        }
    }

    /// Serialized value of one slot; `None` when the session has nothing for it.
    pub fn slot_value(&self, slot: Slot) -> Result<Option<String>, serde_json::Error> {
        Ok(match slot {
            Slot::ResumeFileName => self.file_name.clone(),
            Slot::ResumeText => self.resume_text.as_ref().map(|t| t.as_str().to_string()),
            Slot::ResumeSections => Some(serde_json::to_string(&self.sections)?),
            Slot::JobDescription => self.job_description.clone(),
        })
    }

    pub fn stage(&self) -> Stage {
        match (&self.file_name, &self.job_description) {
            (None, _) => Stage::Upload,
            (Some(_), None) => Stage::JobDescription,
            (Some(_), Some(_)) => Stage::Editor,
        }
    }

    /// Guard for the job-description step.
    pub fn require_upload(&self) -> Result<&str, StageGuardError> {
        self.file_name.as_deref().ok_or(StageGuardError {
            missing: "resume upload",
            redirect_to: UPLOAD_PATH,
        })
    }

    /// Guard for the editor; returns the job description.
    pub fn require_editor(&self) -> Result<&str, StageGuardError> {
        self.require_upload()?;
        self.job_description.as_deref().ok_or(StageGuardError {
            missing: "job description",
            redirect_to: UPLOAD_PATH,
        })
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut ResumeSection> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    /// Copies `suggestions` from `updated` onto the sections with the same id.
    /// Content, titles and order stay as they are here; ids missing from
    /// either side are skipped.
    pub fn merge_suggestions(&mut self, updated: &[ResumeSection]) {
        for section in &mut self.sections {
            let source = updated
                .iter()
                .find(|s| s.id == section.id)
                .and_then(|s| s.suggestions.as_ref());
            if let Some(suggestions) = source {
                section.suggestions = Some(suggestions.clone());
            }
        }
    }

    /// Plain-text rendering: upper-cased titles, each followed by its content.
    pub fn preview(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("{}\n{}", s.title.to_uppercase(), s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
