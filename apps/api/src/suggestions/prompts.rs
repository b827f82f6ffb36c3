// All LLM prompt constants for the suggestion orchestrator.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{NO_FABRICATION_INSTRUCTION, RESUME_WRITER_PERSONA, TAILORING_FOCUS};
use crate::sections::ResumeSection;

/// Shown in place of a suggestion when the call for that section fails.
pub const SUGGESTION_FAILURE_PLACEHOLDER: &str =
    "Failed to generate suggestions for this section. Please try again.";

pub fn suggestion_system_prompt() -> String {
    format!(
        "{RESUME_WRITER_PERSONA} Provide specific, actionable suggestions to improve resume sections. \
         {NO_FABRICATION_INSTRUCTION}"
    )
}

pub fn rewrite_system_prompt() -> String {
    format!(
        "{RESUME_WRITER_PERSONA} Provide complete, well-formatted content that can be used \
         directly in a resume. Return only the section content, without its heading. \
         {NO_FABRICATION_INSTRUCTION}"
    )
}

/// Instruction used for a targeted rewrite when the user supplied none.
pub fn default_rewrite_instruction(section_title: &str) -> String {
    format!("Improve this \"{section_title}\" section to better match the job description")
}

pub fn build_suggestion_prompt(section: &ResumeSection, job_description: &str) -> String {
    format!(
        "I have a resume section titled \"{title}\" with the following content:\n\n\
         {content}\n\n\
         I'm applying for a job with this description:\n\
         {job_description}\n\n\
         Please suggest improvements to make this section more tailored to the job description. \
         {TAILORING_FOCUS} Provide the suggestions in a clear, concise format.",
        title = section.title,
        content = section.content,
    )
}

pub fn build_rewrite_prompt(
    section: &ResumeSection,
    job_description: &str,
    instruction: &str,
) -> String {
    format!(
        "I have a resume section titled \"{title}\" with the following content:\n\n\
         {content}\n\n\
         I'm applying for a job with this description:\n\
         {job_description}\n\n\
         User instruction: {instruction}\n\n\
         Please rewrite this section to be more tailored to the job description. \
         {TAILORING_FOCUS} Provide the complete rewritten section, not just suggestions.",
        title = section.title,
        content = section.content,
    )
}
