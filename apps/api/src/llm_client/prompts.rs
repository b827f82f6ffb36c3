// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Persona shared by every résumé-writing system prompt.
pub const RESUME_WRITER_PERSONA: &str = "You are an expert resume writer who helps job seekers \
    tailor their resumes to specific job descriptions.";

/// Guidance appended to every tailoring prompt.
pub const TAILORING_FOCUS: &str = "Focus on highlighting relevant skills and experiences, \
    using keywords from the job description, and quantifying achievements where possible.";

/// Instruction to keep answers grounded in what the candidate wrote.
pub const NO_FABRICATION_INSTRUCTION: &str = "Do NOT invent employers, titles, dates, degrees \
    or metrics that are not supported by the section content.";
