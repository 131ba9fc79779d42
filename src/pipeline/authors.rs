//! Author detection: metadata parsing merged with AI extraction.
//!
//! Two parallel strategies feed one result. Metadata parsing is pure and
//! deterministic but PDF author fields are frequently garbage ("admin",
//! tool names, a whole department). AI extraction reads the document head
//! and is far more accurate when it is confident. The merge policy trusts
//! a confident AI outright, falls back to metadata when the AI is unsure
//! or empty, and otherwise unions the two with same-person deduplication.
//!
//! AI failure is never fatal here: detection degrades to metadata-only,
//! and only when there is no metadata either does the caller get an error
//! to decide on (typically: leave the author blank).

use crate::backend::{GenerativeBackend, PromptPart};
use crate::config::ConversionConfig;
use crate::error::Paper2BlogError;
use crate::model::{AuthorDetectionResult, AuthorSource, DetectedAuthor};
use crate::pipeline::parse::strip_code_fences;
use crate::prompts::build_author_prompt;
use crate::ratelimit::RateLimiter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed confidence for authors parsed from the PDF metadata string.
const METADATA_CONFIDENCE: u8 = 70;

/// AI top-confidence threshold above which AI results are used alone.
const AI_TRUSTED_CONFIDENCE: u8 = 80;

/// Maximum entries accepted from the AI response.
const AI_MAX_AUTHORS: usize = 10;

/// Detect the document's authors, merging metadata and AI strategies.
///
/// `backend` is optional: without one (or when the backend cannot help),
/// detection is metadata-only. An AI transport or parse failure falls back
/// to metadata when metadata exists, otherwise surfaces as
/// [`Paper2BlogError::AuthorDetectionFailed`].
pub async fn detect_authors(
    text: &str,
    metadata_author: Option<&str>,
    backend: Option<&Arc<dyn GenerativeBackend>>,
    limiter: &RateLimiter,
    config: &ConversionConfig,
) -> Result<AuthorDetectionResult, Paper2BlogError> {
    let metadata_authors = metadata_author
        .map(parse_metadata_authors)
        .unwrap_or_default();

    let ai_authors = match backend {
        Some(backend) => {
            match ai_extract_authors(text, backend, limiter, config).await {
                Ok(authors) => authors,
                Err(e) => {
                    if metadata_authors.is_empty() {
                        return Err(Paper2BlogError::AuthorDetectionFailed {
                            detail: e.to_string(),
                        });
                    }
                    warn!("AI author extraction failed ({e}); using metadata only");
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    Ok(merge_authors(ai_authors, metadata_authors, config.max_authors))
}

/// Parse the PDF metadata author string into low-confidence entries.
///
/// Splits on commas, semicolons, " and ", and ampersands; trims; caps at
/// three entries. Confidence is a fixed 70 — metadata is usually right
/// when present, but presence itself is unreliable.
pub fn parse_metadata_authors(author_field: &str) -> Vec<DetectedAuthor> {
    let normalized = author_field
        .replace(" and ", ",")
        .replace('&', ",")
        .replace(';', ",");

    normalized
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .map(|name| DetectedAuthor {
            name: name.to_string(),
            affiliation: None,
            email: None,
            confidence: METADATA_CONFIDENCE,
        })
        .collect()
}

/// Shape the AI is asked to produce; lenient so junk entries can be
/// dropped instead of failing the whole array.
#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    affiliation: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Ask the backend for an author list from the document head.
async fn ai_extract_authors(
    text: &str,
    backend: &Arc<dyn GenerativeBackend>,
    limiter: &RateLimiter,
    config: &ConversionConfig,
) -> Result<Vec<DetectedAuthor>, Paper2BlogError> {
    let sample: String = text.chars().take(config.author_sample_chars).collect();
    let prompt = build_author_prompt(&sample);

    limiter.acquire().await;
    let response = backend
        .generate(&[PromptPart::text(prompt)], true)
        .await?;

    let cleaned = strip_code_fences(&response);
    let array = outermost_array(cleaned.trim()).unwrap_or(cleaned.trim());

    let raw: Vec<RawAuthor> =
        serde_json::from_str(array).map_err(|e| Paper2BlogError::AiParse {
            detail: format!("author array: {e}"),
        })?;

    let mut authors: Vec<DetectedAuthor> = raw
        .into_iter()
        .filter_map(|r| {
            let name = r.name?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(DetectedAuthor {
                name,
                affiliation: r.affiliation.filter(|a| !a.trim().is_empty()),
                email: r.email.filter(|e| !e.trim().is_empty()),
                confidence: r.confidence.unwrap_or(0.0).clamp(0.0, 100.0) as u8,
            })
        })
        .take(AI_MAX_AUTHORS)
        .collect();

    authors.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    debug!("AI extracted {} authors", authors.len());
    Ok(authors)
}

/// Slice out the outermost `[...]` span, discarding prose around it.
fn outermost_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Apply the merge policy and assemble the final result.
///
/// * AI's top result ≥ 80 confidence → AI results alone.
/// * Metadata present and (AI empty or AI top < 70) → metadata alone.
/// * Otherwise union both, deduplicated by the same-person heuristic.
///
/// `source` reports which strategies *produced* authors (`Both` when each
/// found at least one), independent of which list won; `total_authors_found`
/// is the merged count before truncation.
fn merge_authors(
    ai: Vec<DetectedAuthor>,
    metadata: Vec<DetectedAuthor>,
    max_authors: usize,
) -> AuthorDetectionResult {
    let source = match (!metadata.is_empty(), !ai.is_empty()) {
        (true, true) => AuthorSource::Both,
        (false, true) => AuthorSource::AiExtraction,
        // Default to Metadata when neither produced anything, keeping the
        // field always populated.
        (true, false) | (false, false) => AuthorSource::Metadata,
    };

    let ai_top = ai.first().map(|a| a.confidence).unwrap_or(0);

    let mut merged: Vec<DetectedAuthor> = if !ai.is_empty() && ai_top >= AI_TRUSTED_CONFIDENCE {
        ai
    } else if !metadata.is_empty() && (ai.is_empty() || ai_top < METADATA_CONFIDENCE) {
        metadata
    } else {
        let mut union = ai;
        for m in metadata {
            if !union.iter().any(|a| is_same_person(&a.name, &m.name)) {
                union.push(m);
            }
        }
        union
    };

    merged.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    let total_authors_found = merged.len();
    merged.truncate(max_authors);

    AuthorDetectionResult {
        authors: merged,
        source,
        total_authors_found,
    }
}

/// Same-person heuristic: exact match, substring containment either way,
/// or same last name with the same first initial.
fn is_same_person(a: &str, b: &str) -> bool {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();

    if a_lower == b_lower || a_lower.contains(&b_lower) || b_lower.contains(&a_lower) {
        return true;
    }

    let last = |s: &str| s.split_whitespace().last().map(str::to_string);
    let initial = |s: &str| s.chars().next();
    match (last(&a_lower), last(&b_lower)) {
        (Some(la), Some(lb)) if la == lb => initial(&a_lower) == initial(&b_lower),
        _ => false,
    }
}

/// Format an author list for human display.
///
/// 0 → ""; 1 → the name; 2 → "A and B"; exactly 3 → Oxford-style
/// "A, B, and C"; more than 3 → "A, B, C, et al.".
pub fn format_authors(authors: &[DetectedAuthor]) -> String {
    let names: Vec<&str> = authors.iter().map(|a| a.name.as_str()).collect();
    match names.len() {
        0 => String::new(),
        1 => names[0].to_string(),
        2 => format!("{} and {}", names[0], names[1]),
        3 => format!("{}, {}, and {}", names[0], names[1], names[2]),
        _ => format!("{}, {}, {}, et al.", names[0], names[1], names[2]),
    }
}

/// Identity of a platform user for author matching.
#[derive(Debug, Clone, Default)]
pub struct UserIdentity {
    pub name: String,
    pub email: Option<String>,
    pub alternate_names: Vec<String>,
}

/// Which rule established a user-author match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    ExactName,
    NameContains,
    Email,
    AlternateName,
    LastNameInitial,
}

/// A user-author match and the rule that fired.
#[derive(Debug, Clone)]
pub struct AuthorMatch {
    pub author: DetectedAuthor,
    pub rule: MatchRule,
}

/// Check whether the given user is one of the detected authors.
///
/// Authors are checked in order; for each, rules fire in priority order
/// (exact name, containment, email, alternate names, last-name+initial).
/// The first hit wins.
pub fn match_user(identity: &UserIdentity, authors: &[DetectedAuthor]) -> Option<AuthorMatch> {
    let user_name = identity.name.trim().to_lowercase();

    for author in authors {
        let author_name = author.name.trim().to_lowercase();

        if !user_name.is_empty() && author_name == user_name {
            return Some(AuthorMatch {
                author: author.clone(),
                rule: MatchRule::ExactName,
            });
        }

        if !user_name.is_empty()
            && (author_name.contains(&user_name) || user_name.contains(&author_name))
        {
            return Some(AuthorMatch {
                author: author.clone(),
                rule: MatchRule::NameContains,
            });
        }

        if let (Some(user_email), Some(author_email)) = (&identity.email, &author.email) {
            if user_email.to_lowercase() == author_email.to_lowercase() {
                return Some(AuthorMatch {
                    author: author.clone(),
                    rule: MatchRule::Email,
                });
            }
        }

        for alt in &identity.alternate_names {
            let alt = alt.trim().to_lowercase();
            if !alt.is_empty()
                && (author_name == alt
                    || author_name.contains(&alt)
                    || alt.contains(&author_name))
            {
                return Some(AuthorMatch {
                    author: author.clone(),
                    rule: MatchRule::AlternateName,
                });
            }
        }

        if !user_name.is_empty() && is_same_person(&user_name, &author_name) {
            return Some(AuthorMatch {
                author: author.clone(),
                rule: MatchRule::LastNameInitial,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str, confidence: u8) -> DetectedAuthor {
        DetectedAuthor {
            name: name.to_string(),
            affiliation: None,
            email: None,
            confidence,
        }
    }

    // ── Metadata parsing ─────────────────────────────────────────────────

    #[test]
    fn metadata_splits_on_all_separators() {
        let authors = parse_metadata_authors("Alice Smith and Bob Jones; Carol Wu");
        assert_eq!(authors.len(), 3);
        assert_eq!(authors[0].name, "Alice Smith");
        assert_eq!(authors[1].name, "Bob Jones");
        assert_eq!(authors[2].name, "Carol Wu");
        assert!(authors.iter().all(|a| a.confidence == 70));
    }

    #[test]
    fn metadata_caps_at_three() {
        let authors = parse_metadata_authors("A One, B Two, C Three, D Four");
        assert_eq!(authors.len(), 3);
    }

    #[test]
    fn metadata_ampersand_and_empty_pieces() {
        let authors = parse_metadata_authors("A One & , B Two");
        assert_eq!(authors.len(), 2);
    }

    // ── Merge policy ─────────────────────────────────────────────────────

    #[test]
    fn confident_ai_wins_alone() {
        let result = merge_authors(
            vec![author("Jane Roe", 95), author("John Doe", 85)],
            vec![author("Metadata Person", 70)],
            3,
        );
        assert_eq!(result.authors.len(), 2);
        assert_eq!(result.authors[0].name, "Jane Roe");
        // Both strategies produced authors, so source reports Both.
        assert_eq!(result.source, AuthorSource::Both);
        assert_eq!(result.total_authors_found, 2);
    }

    #[test]
    fn weak_ai_with_metadata_uses_metadata() {
        let result = merge_authors(
            vec![author("Maybe Someone", 40)],
            vec![author("Listed Author", 70)],
            3,
        );
        assert_eq!(result.authors.len(), 1);
        assert_eq!(result.authors[0].name, "Listed Author");
        assert_eq!(result.source, AuthorSource::Both);
    }

    #[test]
    fn empty_ai_uses_metadata_with_metadata_source() {
        let result = merge_authors(Vec::new(), vec![author("Only Metadata", 70)], 3);
        assert_eq!(result.source, AuthorSource::Metadata);
        assert_eq!(result.authors[0].name, "Only Metadata");
    }

    #[test]
    fn middling_ai_unions_with_dedup() {
        // AI top in [70, 80): union branch.
        let result = merge_authors(
            vec![author("J. Smith", 75), author("Ada Lovelace", 72)],
            vec![author("John Smith", 70), author("Grace Hopper", 70)],
            5,
        );
        // "J. Smith" and "John Smith" share last name + first initial.
        let names: Vec<&str> = result.authors.iter().map(|a| a.name.as_str()).collect();
        assert!(names.contains(&"J. Smith"));
        assert!(!names.contains(&"John Smith"));
        assert!(names.contains(&"Grace Hopper"));
        assert_eq!(result.total_authors_found, 3);
    }

    #[test]
    fn truncation_reports_pre_truncation_total() {
        let result = merge_authors(
            vec![
                author("A One", 90),
                author("B Two", 88),
                author("C Three", 86),
                author("D Four", 84),
                author("E Five", 82),
            ],
            Vec::new(),
            3,
        );
        assert_eq!(result.authors.len(), 3);
        assert_eq!(result.total_authors_found, 5);
        assert_eq!(result.source, AuthorSource::AiExtraction);
    }

    #[test]
    fn neither_strategy_defaults_to_metadata_source() {
        let result = merge_authors(Vec::new(), Vec::new(), 3);
        assert!(result.authors.is_empty());
        assert_eq!(result.source, AuthorSource::Metadata);
        assert_eq!(result.total_authors_found, 0);
    }

    // ── Formatting ───────────────────────────────────────────────────────

    #[test]
    fn format_authors_table() {
        let a = author("A", 70);
        let b = author("B", 70);
        let c = author("C", 70);
        let d = author("D", 70);
        assert_eq!(format_authors(&[]), "");
        assert_eq!(format_authors(&[a.clone()]), "A");
        assert_eq!(format_authors(&[a.clone(), b.clone()]), "A and B");
        assert_eq!(
            format_authors(&[a.clone(), b.clone(), c.clone()]),
            "A, B, and C"
        );
        assert_eq!(format_authors(&[a, b, c, d]), "A, B, C, et al.");
    }

    // ── User matching ────────────────────────────────────────────────────

    #[test]
    fn exact_name_match_fires_first() {
        let authors = [author("Jane Roe", 90)];
        let m = match_user(
            &UserIdentity {
                name: "jane roe".into(),
                ..Default::default()
            },
            &authors,
        )
        .unwrap();
        assert_eq!(m.rule, MatchRule::ExactName);
    }

    #[test]
    fn substring_containment_matches() {
        let authors = [author("Dr. Jane Roe PhD", 90)];
        let m = match_user(
            &UserIdentity {
                name: "Jane Roe".into(),
                ..Default::default()
            },
            &authors,
        )
        .unwrap();
        assert_eq!(m.rule, MatchRule::NameContains);
    }

    #[test]
    fn email_matches_case_insensitively() {
        let mut a = author("Someone Else Entirely", 90);
        a.email = Some("Jane@Uni.edu".into());
        let m = match_user(
            &UserIdentity {
                name: "No Overlap".into(),
                email: Some("jane@uni.edu".into()),
                alternate_names: Vec::new(),
            },
            &[a],
        )
        .unwrap();
        assert_eq!(m.rule, MatchRule::Email);
    }

    #[test]
    fn alternate_name_matches() {
        let authors = [author("Jane Roe", 90)];
        let m = match_user(
            &UserIdentity {
                name: "Completely Different".into(),
                email: None,
                alternate_names: vec!["J. Roe".into(), "Jane Roe".into()],
            },
            &authors,
        )
        .unwrap();
        assert_eq!(m.rule, MatchRule::AlternateName);
    }

    #[test]
    fn last_name_initial_matches() {
        let authors = [author("J. Roe", 90)];
        let m = match_user(
            &UserIdentity {
                name: "jane roe".into(),
                ..Default::default()
            },
            &authors,
        )
        .unwrap();
        assert_eq!(m.rule, MatchRule::LastNameInitial);
    }

    #[test]
    fn no_match_returns_none() {
        let authors = [author("Jane Roe", 90)];
        assert!(match_user(
            &UserIdentity {
                name: "Bob Smith".into(),
                ..Default::default()
            },
            &authors,
        )
        .is_none());
    }

    // ── Raw entry filtering ──────────────────────────────────────────────

    #[test]
    fn raw_entries_without_names_are_dropped() {
        let raw: Vec<RawAuthor> = serde_json::from_str(
            r#"[{"name":"Good Author","confidence":90},{"confidence":80},{"name":"  "}]"#,
        )
        .unwrap();
        let kept: Vec<_> = raw
            .into_iter()
            .filter_map(|r| r.name.filter(|n| !n.trim().is_empty()))
            .collect();
        assert_eq!(kept, vec!["Good Author"]);
    }
}
