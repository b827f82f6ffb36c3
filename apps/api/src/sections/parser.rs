//! Section Parser: splits extracted résumé text into an ordered, flat list
//! of `ResumeSection`s.
//!
//! Pure and deterministic: no I/O, no LLM call. Same input, same output.

use crate::sections::headings::{detect_heading, GenericHeadings, Heading};
use crate::sections::models::ResumeSection;

/// Used when the text contains no heading at all.
pub const FALLBACK_SECTION_ID: &str = "content";
pub const FALLBACK_SECTION_TITLE: &str = "Resume Content";

/// Holds the name/contact block that precedes the first heading.
pub const HEADER_SECTION_ID: &str = "header";
pub const HEADER_SECTION_TITLE: &str = "Header";

const CUSTOM_SLUG_FALLBACK: &str = "other";

/// Parses raw résumé text into sections.
///
/// Returns an empty list only when the input is blank. Non-blank input with
/// no detectable heading yields a single `content` section holding the whole
/// (trimmed) text.
///
/// Generic (non-canonical) headings are not recognised in the opening block,
/// i.e. every line up to the first blank line, which is where the name and
/// contact details sit. Once a canonical section is open, a generic heading
/// must be ALL-CAPS or end with `:`.
pub fn parse_resume_text(text: &str) -> Vec<ResumeSection> {
    let normalized = normalize_line_endings(text);
    if normalized.trim().is_empty() {
        return Vec::new();
    }

    let mut preamble: Vec<&str> = Vec::new();
    let mut blocks: Vec<(Heading, Vec<&str>)> = Vec::new();
    let mut previous: Option<&str> = None;
    let mut in_opening_block = true;
    let mut canonical_open = false;

    for line in normalized.split('\n') {
        let generic = if in_opening_block {
            GenericHeadings::Off
        } else if canonical_open {
            GenericHeadings::Strict
        } else {
            GenericHeadings::Lenient
        };

        if let Some(heading) = detect_heading(line, previous, generic) {
            in_opening_block = false;
            canonical_open |= matches!(heading, Heading::Known(_));
            blocks.push((heading, Vec::new()));
        } else if let Some((_, lines)) = blocks.last_mut() {
            lines.push(line);
        } else {
            preamble.push(line);
        }
        if line.trim().is_empty() && previous.is_some_and(|p| !p.trim().is_empty()) {
            in_opening_block = false;
        }
        previous = Some(line);
    }

    if blocks.is_empty() {
        return vec![ResumeSection::new(
            FALLBACK_SECTION_ID,
            FALLBACK_SECTION_TITLE,
            normalized.trim(),
        )];
    }

    let mut builder = SectionListBuilder::default();

    let header = trim_blank_lines(&preamble);
    if !header.is_empty() {
        builder.push_custom(HEADER_SECTION_ID, HEADER_SECTION_TITLE, header);
    }

    for (heading, lines) in blocks {
        let content = trim_blank_lines(&lines);
        match heading {
            Heading::Known(canonical) => {
                builder.push_canonical(canonical.id, canonical.title, content)
            }
            Heading::Custom(title) => {
                let slug = slugify(&title);
                builder.push_custom(&slug, &title, content);
            }
        }
    }

    builder.sections
}

#[derive(Default)]
struct SectionListBuilder {
    sections: Vec<ResumeSection>,
}

impl SectionListBuilder {
    /// A repeated canonical heading merges into the first occurrence.
    fn push_canonical(&mut self, id: &str, title: &str, content: String) {
        match self.sections.iter_mut().find(|s| s.id == id) {
            Some(existing) => append_block(&mut existing.content, &content),
            None => self.sections.push(ResumeSection::new(id, title, content)),
        }
    }

    /// Custom headings never merge; colliding slugs get `-2`, `-3`, ...
    fn push_custom(&mut self, base_id: &str, title: &str, content: String) {
        let id = self.unique_id(base_id);
        self.sections.push(ResumeSection::new(id, title, content));
    }

    fn unique_id(&self, base: &str) -> String {
        let taken = |candidate: &str| self.sections.iter().any(|s| s.id == candidate);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

/// Joins two content blocks with a blank line. Empty blocks add nothing.
fn append_block(existing: &mut String, addition: &str) {
    if addition.is_empty() {
        return;
    }
    if !existing.is_empty() {
        existing.push_str("\n\n");
    }
    existing.push_str(addition);
}

/// Drops leading and trailing whitespace-only lines, keeps the rest verbatim.
fn trim_blank_lines(lines: &[&str]) -> String {
    let is_blank = |line: &&str| line.trim().is_empty();
    let Some(start) = lines.iter().position(|l| !is_blank(l)) else {
        return String::new();
    };
    let end = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(start);
    lines[start..=end].join("\n")
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Lower-case alphanumeric runs joined by `-`; "other" when nothing is left.
pub fn slugify(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        CUSTOM_SLUG_FALLBACK.to_string()
    } else {
        slug
    }
}
