//! Journal-format validation: reject non-academic documents early.
//!
//! Conversion is expensive — image extraction, multiple backend calls,
//! uploads. This gate runs on raw text alone and rejects documents that do
//! not look like papers before any of that work happens. Four independent
//! signals are checked; all must pass. Each failure maps to a distinct
//! [`RejectionReason`] so logs and tests can name the missing signal.

use crate::error::RejectionReason;
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum trimmed text length for a plausible paper.
const MIN_TEXT_LEN: usize = 500;

/// Minimum distinct academic-keyword hits.
const MIN_KEYWORD_HITS: usize = 3;

/// Minimum distinct structural-section hits.
const MIN_SECTION_HITS: usize = 2;

/// Vocabulary that appears in virtually every paper in some combination.
/// Substring matched, case-insensitive.
const ACADEMIC_KEYWORDS: &[&str] = &[
    "abstract",
    "introduction",
    "methodology",
    "method",
    "results",
    "discussion",
    "conclusion",
    "references",
    "literature review",
    "hypothesis",
    "research question",
    "data analysis",
    "findings",
    "study",
    "experiment",
    "survey",
    "participants",
    "sample",
    "analysis",
    "significant",
    "doi",
    "journal",
    "issn",
    "volume",
    "peer review",
];

/// Structural section headings, word-boundary matched.
static SECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\babstract\b",
        r"(?i)\bintroduction\b",
        r"(?i)\b(?:method|methodology|materials)\b",
        r"(?i)\bresults?\b",
        r"(?i)\b(?:conclusion|discussion)\b",
        r"(?i)\breferences?\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("section pattern"))
    .collect()
});

/// Citation shapes: bracketed numerals, parenthetical years, et al., DOIs.
static CITATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[\d+\]",
        r"\((?:19|20)\d{2}\)",
        r"(?i)\bet al\.",
        r"(?i)doi:\s*10\.",
        r"https?://doi\.org",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("citation pattern"))
    .collect()
});

/// Check whether the text passes all four academic-format gates.
///
/// Returns the first failing gate; gates run cheapest-first.
pub fn validate_journal(text: &str) -> Result<(), RejectionReason> {
    if text.trim().chars().count() < MIN_TEXT_LEN {
        return Err(RejectionReason::TooShort);
    }

    let lower = text.to_lowercase();
    let keyword_hits = ACADEMIC_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();
    if keyword_hits < MIN_KEYWORD_HITS {
        return Err(RejectionReason::TooFewKeywords);
    }

    let section_hits = SECTION_PATTERNS
        .iter()
        .filter(|re| re.is_match(text))
        .count();
    if section_hits < MIN_SECTION_HITS {
        return Err(RejectionReason::TooFewSections);
    }

    let has_citation = CITATION_PATTERNS.iter().any(|re| re.is_match(text));
    if !has_citation {
        return Err(RejectionReason::NoCitations);
    }

    Ok(())
}

/// Boolean convenience wrapper over [`validate_journal`].
pub fn is_valid_journal(text: &str) -> bool {
    validate_journal(text).is_ok()
}
