//! Suggestion Orchestrator: drives the text generator over a section list.
//!
//! Two operations:
//!   * bulk pass: one suggestion call per section, strictly sequential,
//!     failures isolated to the section that caused them;
//!   * targeted rewrite: replaces one section's content with generated text.
//!
//! Every outbound call is bounded by a timeout. Nothing here retries: a
//! failed section is retried only when the user asks again.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{LlmError, TextGenerator};
use crate::sections::ResumeSection;
use crate::suggestions::prompts::{
    build_rewrite_prompt, build_suggestion_prompt, default_rewrite_instruction,
    rewrite_system_prompt, suggestion_system_prompt, SUGGESTION_FAILURE_PLACEHOLDER,
};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("section '{0}' not found")]
    SectionNotFound(String),

    #[error("text generation failed: {0}")]
    GenerationFailure(#[from] LlmError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Succeeded,
    Failed { reason: String },
}

/// Per-section result of a bulk pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionOutcome {
    pub section_id: String,
    #[serde(flatten)]
    pub status: SectionStatus,
}

impl SectionOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, SectionStatus::Succeeded)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Requests suggestions for every section, in order, one call at a time.
///
/// On success the section's `suggestions` is set to the generated text; on
/// any failure it is set to `SUGGESTION_FAILURE_PLACEHOLDER` and the pass
/// moves on. `content` is never modified. Always returns one outcome per
/// section.
pub async fn run_bulk_pass(
    generator: &dyn TextGenerator,
    sections: &mut [ResumeSection],
    job_description: &str,
    timeout: Duration,
) -> Vec<SectionOutcome> {
    let system = suggestion_system_prompt();
    let mut outcomes = Vec::with_capacity(sections.len());

    for section in sections.iter_mut() {
        let prompt = build_suggestion_prompt(section, job_description);
        let status = match generate_bounded(generator, &system, &prompt, timeout).await {
            Ok(text) => {
                section.suggestions = Some(text);
                SectionStatus::Succeeded
            }
            Err(e) => {
                warn!(section_id = %section.id, "Suggestion generation failed: {e}");
                section.suggestions = Some(SUGGESTION_FAILURE_PLACEHOLDER.to_string());
                SectionStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcomes.push(SectionOutcome {
            section_id: section.id.clone(),
            status,
        });
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    info!(
        sections = outcomes.len(),
        failed, "Bulk suggestion pass finished"
    );
    outcomes
}

/// Rewrites one section's content for the job description.
///
/// `section_id: None` targets the first section. A blank or missing
/// instruction falls back to the default improvement request. On failure the
/// sections are left untouched.
pub async fn rewrite_section(
    generator: &dyn TextGenerator,
    sections: &mut [ResumeSection],
    section_id: Option<&str>,
    job_description: &str,
    instruction: Option<&str>,
    timeout: Duration,
) -> Result<ResumeSection, OrchestratorError> {
    let section = match section_id {
        Some(id) => sections.iter_mut().find(|s| s.id == id),
        None => sections.first_mut(),
    }
    .ok_or_else(|| OrchestratorError::SectionNotFound(section_id.unwrap_or_default().to_string()))?;

    let instruction = match instruction.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => default_rewrite_instruction(&section.title),
    };

    let prompt = build_rewrite_prompt(section, job_description, &instruction);
    let text = generate_bounded(generator, &rewrite_system_prompt(), &prompt, timeout).await?;

    info!(section_id = %section.id, "Section rewritten");
    section.content = text;
    Ok(section.clone())
}

/// One generator call under a deadline. Blank answers count as failures.
async fn generate_bounded(
    generator: &dyn TextGenerator,
    system: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<String, LlmError> {
    let text = tokio::time::timeout(timeout, generator.generate(system, prompt))
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;

    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestions::testing::{HangingGenerator, ScriptedGenerator};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn three_sections() -> Vec<ResumeSection> {
        vec![
            ResumeSection::new("summary", "Professional Summary", "Backend engineer."),
            ResumeSection::new("experience", "Work Experience", "Acme Corp, 2020-2024"),
            ResumeSection::new("skills", "Skills", "Rust, SQL"),
        ]
    }

    #[tokio::test]
    async fn test_bulk_pass_isolates_a_failing_section() {
        let generator = ScriptedGenerator::new(vec![
            Ok("Mention Rust services".to_string()),
            Err(LlmError::Api {
                status: 529,
                message: "Overloaded".to_string(),
            }),
            Ok("Group skills by domain".to_string()),
        ]);
        let mut sections = three_sections();

        let outcomes = run_bulk_pass(&generator, &mut sections, "Rust backend role", TIMEOUT).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].succeeded());
        assert!(!outcomes[1].succeeded());
        assert!(outcomes[2].succeeded());
        assert_eq!(sections[0].suggestions.as_deref(), Some("Mention Rust services"));
        assert_eq!(
            sections[1].suggestions.as_deref(),
            Some(SUGGESTION_FAILURE_PLACEHOLDER)
        );
        assert_eq!(sections[2].suggestions.as_deref(), Some("Group skills by domain"));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_bulk_pass_never_touches_content() {
        let generator = ScriptedGenerator::always("Use stronger verbs");
        let mut sections = three_sections();
        let before: Vec<String> = sections.iter().map(|s| s.content.clone()).collect();

        run_bulk_pass(&generator, &mut sections, "Rust backend role", TIMEOUT).await;

        let after: Vec<String> = sections.iter().map(|s| s.content.clone()).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_bulk_pass_prompts_follow_section_order() {
        let generator = ScriptedGenerator::always("ok");
        let mut sections = three_sections();

        run_bulk_pass(&generator, &mut sections, "Rust backend role", TIMEOUT).await;

        let prompts = generator.prompts();
        assert!(prompts[0].contains("\"Professional Summary\""));
        assert!(prompts[1].contains("\"Work Experience\""));
        assert!(prompts[2].contains("\"Skills\""));
        assert!(prompts.iter().all(|p| p.contains("Rust backend role")));
    }

    #[tokio::test]
    async fn test_blank_answer_counts_as_failure() {
        let generator = ScriptedGenerator::new(vec![Ok("   \n".to_string())]);
        let mut sections = vec![ResumeSection::new("skills", "Skills", "Rust")];

        let outcomes = run_bulk_pass(&generator, &mut sections, "jd", TIMEOUT).await;

        assert!(!outcomes[0].succeeded());
        assert_eq!(
            sections[0].suggestions.as_deref(),
            Some(SUGGESTION_FAILURE_PLACEHOLDER)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_pass_times_out_slow_calls() {
        let mut sections = three_sections();

        let outcomes =
            run_bulk_pass(&HangingGenerator, &mut sections, "jd", Duration::from_secs(1)).await;

        assert!(outcomes.iter().all(|o| !o.succeeded()));
        assert!(matches!(
            &outcomes[0].status,
            SectionStatus::Failed { reason } if reason.contains("timed out")
        ));
    }

    #[tokio::test]
    async fn test_bulk_pass_over_empty_list() {
        let generator = ScriptedGenerator::always("unused");
        let outcomes = run_bulk_pass(&generator, &mut [], "jd", TIMEOUT).await;
        assert!(outcomes.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_only_the_target_section() {
        let generator = ScriptedGenerator::always("Led Rust migrations at Acme Corp");
        let mut sections = three_sections();

        let updated = rewrite_section(
            &generator,
            &mut sections,
            Some("experience"),
            "Rust backend role",
            Some("Emphasize Rust"),
            TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(updated.content, "Led Rust migrations at Acme Corp");
        assert_eq!(sections[1].content, "Led Rust migrations at Acme Corp");
        assert_eq!(sections[0].content, "Backend engineer.");
        assert_eq!(sections[2].content, "Rust, SQL");
        assert!(generator.prompts()[0].contains("User instruction: Emphasize Rust"));
    }

    #[tokio::test]
    async fn test_rewrite_uses_default_instruction_when_blank() {
        let generator = ScriptedGenerator::always("Better skills");
        let mut sections = three_sections();

        rewrite_section(&generator, &mut sections, Some("skills"), "jd", Some("  "), TIMEOUT)
            .await
            .unwrap();

        assert!(generator.prompts()[0].contains(
            "User instruction: Improve this \"Skills\" section to better match the job description"
        ));
    }

    #[tokio::test]
    async fn test_rewrite_without_section_id_targets_first_section() {
        let generator = ScriptedGenerator::always("Sharper summary");
        let mut sections = three_sections();

        let updated = rewrite_section(&generator, &mut sections, None, "jd", None, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(updated.id, "summary");
        assert_eq!(sections[0].content, "Sharper summary");
    }

    #[tokio::test]
    async fn test_rewrite_unknown_section() {
        let generator = ScriptedGenerator::always("unused");
        let mut sections = three_sections();

        let result =
            rewrite_section(&generator, &mut sections, Some("awards"), "jd", None, TIMEOUT).await;

        assert!(matches!(result, Err(OrchestratorError::SectionNotFound(id)) if id == "awards"));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_failure_leaves_sections_untouched() {
        let generator = ScriptedGenerator::new(vec![Err(LlmError::EmptyContent)]);
        let mut sections = three_sections();
        let before = sections.clone();

        let result =
            rewrite_section(&generator, &mut sections, Some("summary"), "jd", None, TIMEOUT).await;

        assert!(matches!(result, Err(OrchestratorError::GenerationFailure(_))));
        assert_eq!(sections, before);
    }

    #[test]
    fn test_outcome_serialization() {
        let failed = SectionOutcome {
            section_id: "skills".to_string(),
            status: SectionStatus::Failed {
                reason: "LLM returned empty content".to_string(),
            },
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["section_id"], "skills");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "LLM returned empty content");
    }
}
