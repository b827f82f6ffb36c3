// Résumé sectioning: heading detection and the section parser.
// Pure text processing; nothing in this module performs I/O.

pub mod headings;
pub mod models;
pub mod parser;

pub use models::{default_sections, RawResumeText, ResumeSection};
pub use parser::parse_resume_text;
