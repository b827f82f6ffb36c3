//! Heading detection: the canonical section table plus the generic
//! "looks like a heading" heuristic.
//!
//! Known headings are matched on a normalised form of the whole line, so
//! "WORK HISTORY:", "## Experience" and "Skills & Abilities" all resolve.
//! Everything else has to pass `looks_like_heading`, and how much of it
//! applies depends on where the line sits (see `GenericHeadings`).

/// A section type the parser recognises by name.
#[derive(Debug, PartialEq, Eq)]
pub struct CanonicalSection {
    pub id: &'static str,
    pub title: &'static str,
    /// Normalised spellings (see `normalize_heading`).
    pub synonyms: &'static [&'static str],
}

pub const CANONICAL_SECTIONS: &[CanonicalSection] = &[
    CanonicalSection {
        id: "summary",
        title: "Professional Summary",
        synonyms: &[
            "summary",
            "professional summary",
            "profile",
            "professional profile",
            "objective",
            "career objective",
            "career summary",
            "executive summary",
            "about me",
        ],
    },
    CanonicalSection {
        id: "experience",
        title: "Work Experience",
        synonyms: &[
            "experience",
            "work experience",
            "professional experience",
            "work history",
            "employment",
            "employment history",
            "career history",
            "relevant experience",
        ],
    },
    CanonicalSection {
        id: "education",
        title: "Education",
        synonyms: &[
            "education",
            "academic background",
            "education and training",
            "academic history",
        ],
    },
    CanonicalSection {
        id: "skills",
        title: "Skills",
        synonyms: &[
            "skills",
            "technical skills",
            "core competencies",
            "competencies",
            "key skills",
            "skills and abilities",
            "areas of expertise",
        ],
    },
    CanonicalSection {
        id: "projects",
        title: "Projects",
        synonyms: &["projects", "personal projects", "key projects"],
    },
    CanonicalSection {
        id: "certifications",
        title: "Certifications",
        synonyms: &[
            "certifications",
            "certificates",
            "licenses and certifications",
        ],
    },
    CanonicalSection {
        id: "awards",
        title: "Awards",
        synonyms: &["awards", "honors", "honors and awards", "achievements"],
    },
    CanonicalSection {
        id: "publications",
        title: "Publications",
        synonyms: &["publications"],
    },
    CanonicalSection {
        id: "languages",
        title: "Languages",
        synonyms: &["languages"],
    },
    CanonicalSection {
        id: "volunteer",
        title: "Volunteer Experience",
        synonyms: &["volunteer", "volunteering", "volunteer experience"],
    },
    CanonicalSection {
        id: "interests",
        title: "Interests",
        synonyms: &["interests", "hobbies", "hobbies and interests"],
    },
];

/// Generic headings longer than this are treated as content.
const MAX_HEADING_CHARS: usize = 40;
const MAX_HEADING_WORDS: usize = 5;

/// Words allowed to stay lower-case inside a title-cased heading.
const MINOR_WORDS: &[&str] = &["and", "of", "the", "for", "in", "to", "&"];

const BULLET_MARKERS: &[char] = &['-', '*', '•', '·', '–', '—', '>', '+', '▪', '◦'];

/// Characters that never appear inside a heading but do appear in
/// "Label: value" content lines.
const NON_HEADING_CHARS: &[char] = &[':', ',', ';', '|', '@', '•'];

/// A detected heading line.
#[derive(Debug, PartialEq, Eq)]
pub enum Heading {
    Known(&'static CanonicalSection),
    Custom(String),
}

/// Lower-cases, maps `&` to "and", turns every other non-alphanumeric into
/// a space, and collapses whitespace.
pub fn normalize_heading(line: &str) -> String {
    let mut spaced = String::with_capacity(line.len());
    for ch in line.chars() {
        if ch == '&' {
            spaced.push_str(" and ");
        } else if ch.is_alphanumeric() {
            spaced.extend(ch.to_lowercase());
        } else {
            spaced.push(' ');
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn match_known(line: &str) -> Option<&'static CanonicalSection> {
    let normalized = normalize_heading(line);
    if normalized.is_empty() {
        return None;
    }
    CANONICAL_SECTIONS
        .iter()
        .find(|section| section.synonyms.contains(&normalized.as_str()))
}

/// Strips markdown-style decorations and a trailing colon.
pub fn clean_heading_title(line: &str) -> &str {
    let trimmed = line
        .trim()
        .trim_matches(|c| matches!(c, '#' | '*' | '=' | '_'))
        .trim();
    trimmed.strip_suffix(':').unwrap_or(trimmed).trim_end()
}

/// The generic heuristic for headings outside the canonical table:
///
/// - previous line blank (or start of input)
/// - 2–40 characters, at most 5 words, at least 2 letters, no digits
/// - no bullet marker, no sentence punctuation at the end, no `:`/`,`/`|`
///   inside
/// - all upper-case, or every non-minor word capitalised
pub fn looks_like_heading(line: &str, previous: Option<&str>) -> bool {
    if previous.is_some_and(|p| !p.trim().is_empty()) {
        return false;
    }

    let raw = line.trim();
    if raw.starts_with(BULLET_MARKERS) && !raw.starts_with("**") {
        return false;
    }

    let title = clean_heading_title(line);
    let char_count = title.chars().count();
    if !(2..=MAX_HEADING_CHARS).contains(&char_count) {
        return false;
    }
    if title.ends_with(['.', ',', ';', '!', '?'])
        || title.contains(NON_HEADING_CHARS)
        || title.chars().any(|c| c.is_ascii_digit())
    {
        return false;
    }

    let letters: Vec<char> = title.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 2 {
        return false;
    }

    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() > MAX_HEADING_WORDS {
        return false;
    }

    let all_upper = letters.iter().all(|c| !c.is_lowercase());
    all_upper || is_title_case(&words)
}

fn is_title_case(words: &[&str]) -> bool {
    words.iter().enumerate().all(|(i, word)| {
        let Some(first_letter) = word.chars().find(|c| c.is_alphabetic()) else {
            return true;
        };
        if first_letter.is_uppercase() {
            return true;
        }
        i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str())
    })
}

/// How much of the generic heuristic applies at a given point in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericHeadings {
    /// Only canonical headings; used for the opening name/contact block.
    Off,
    /// ALL-CAPS or colon-terminated lines only; used once a canonical
    /// section is open, where title-cased lines are usually job titles.
    Strict,
    /// The full heuristic, title case included.
    Lenient,
}

/// All letters upper-case, or a trailing `:` on the raw line.
fn is_emphatic(line: &str) -> bool {
    let raw = line.trim().trim_end_matches(['*', '#', '=', '_']).trim_end();
    raw.ends_with(':')
        || clean_heading_title(line)
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| !c.is_lowercase())
}

/// Classifies a line. Known headings win regardless of the previous line
/// and of `generic`.
pub fn detect_heading(
    line: &str,
    previous: Option<&str>,
    generic: GenericHeadings,
) -> Option<Heading> {
    if line.trim().is_empty() {
        return None;
    }
    if let Some(known) = match_known(line) {
        return Some(Heading::Known(known));
    }
    let accepted = match generic {
        GenericHeadings::Off => false,
        GenericHeadings::Strict => looks_like_heading(line, previous) && is_emphatic(line),
        GenericHeadings::Lenient => looks_like_heading(line, previous),
    };
    accepted.then(|| Heading::Custom(clean_heading_title(line).to_string()))
}
