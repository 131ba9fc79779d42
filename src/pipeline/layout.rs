//! Layout parsing: linearized text → typed heading/paragraph sections.
//!
//! Extracted PDF text has no markup, so structure is recovered
//! heuristically. The heading rule is deliberately simple and must stay
//! stable — downstream prompting depends on the heading/paragraph
//! distinction, and the AI sees headings as `## ` lines.
//!
//! Page numbers are estimated from a running character counter divided by
//! a configurable per-page constant, bumped on explicit form feeds. The
//! estimate is approximate by design; it only needs to be deterministic
//! for a given input.

use crate::model::{LayoutSection, SectionKind};

/// Line length above which a line can never be a heading.
const MAX_HEADING_LEN: usize = 80;

/// Parse linearized document text into an ordered section sequence.
///
/// Consecutive non-heading lines merge into one paragraph section; a
/// detected heading flushes the current paragraph and emits a heading
/// section. Blank lines are skipped entirely — they never become sections
/// and never reset accumulation.
pub fn parse_layout(text: &str, chars_per_page: usize) -> Vec<LayoutSection> {
    let lines: Vec<&str> = text.lines().collect();
    let mut sections = Vec::new();

    let mut paragraph = String::new();
    let mut paragraph_page = 1usize;

    let mut chars = 0usize;
    let mut page_offset = 0usize;

    let flush =
        |sections: &mut Vec<LayoutSection>, paragraph: &mut String, page: usize| {
            if !paragraph.is_empty() {
                sections.push(LayoutSection {
                    kind: SectionKind::Paragraph,
                    content: std::mem::take(paragraph),
                    heading_level: None,
                    page_number: page,
                });
            }
        };

    for (i, raw_line) in lines.iter().enumerate() {
        // Explicit page breaks override the character estimate.
        if raw_line.contains('\u{0C}') {
            page_offset += 1;
            chars = 0;
        }
        let line = raw_line.replace('\u{0C}', "");
        let line = line.trim();

        chars += line.chars().count();
        let page = page_offset + chars / chars_per_page + 1;

        if line.is_empty() {
            continue;
        }

        let next_blank = lines
            .get(i + 1)
            .map(|l| l.trim().is_empty())
            .unwrap_or(true);

        if let Some(level) = heading_level(line, next_blank) {
            flush(&mut sections, &mut paragraph, paragraph_page);
            sections.push(LayoutSection {
                kind: SectionKind::Heading,
                content: line.to_string(),
                heading_level: Some(level),
                page_number: page,
            });
        } else {
            if paragraph.is_empty() {
                paragraph_page = page;
            } else {
                paragraph.push(' ');
            }
            paragraph.push_str(line);
        }
    }

    flush(&mut sections, &mut paragraph, paragraph_page);
    sections
}

/// Classify a line as a heading, returning its level (1–3), or `None`.
///
/// A line is a heading when it is shorter than 80 characters AND either
/// fully upper-case and longer than 3 characters, or free of terminal
/// sentence punctuation with the following line blank or absent.
fn heading_level(line: &str, next_blank: bool) -> Option<u8> {
    let len = line.chars().count();
    if len >= MAX_HEADING_LEN {
        return None;
    }

    let upper = is_all_caps(line);
    let no_terminal_punct = !line.ends_with(['.', '!', '?']);

    let is_heading = (upper && len > 3) || (no_terminal_punct && next_blank);
    if !is_heading {
        return None;
    }

    Some(if upper && len < 30 {
        1
    } else if len < 50 {
        2
    } else {
        3
    })
}

/// Fully upper-case: contains at least one alphabetic character and no
/// lower-case ones. Digits and punctuation are neutral, so "SECTION 2" and
/// "RESULTS & DISCUSSION" qualify.
fn is_all_caps(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic()) && !line.chars().any(|c| c.is_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARS_PER_PAGE: usize = 3000;

    #[test]
    fn all_caps_line_is_level_one_heading() {
        let sections = parse_layout("INTRODUCTION\nBody text follows.", CHARS_PER_PAGE);
        assert_eq!(sections[0].kind, SectionKind::Heading);
        assert_eq!(sections[0].heading_level, Some(1));
        assert_eq!(sections[0].content, "INTRODUCTION");
    }

    #[test]
    fn unpunctuated_line_before_blank_is_heading() {
        let text = "A somewhat longer heading phrase without punctuation\n\nBody.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections[0].kind, SectionKind::Heading);
        // 51 chars: not all-caps level 1, over the 50-char level-2 bound.
        assert_eq!(sections[0].heading_level, Some(3));
    }

    #[test]
    fn medium_unpunctuated_line_is_level_two() {
        let text = "Results of the first experiment\n\nBody.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections[0].heading_level, Some(2));
    }

    #[test]
    fn sentence_with_period_is_never_a_heading() {
        let text = "This is a normal sentence.\n\nAnother one.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert!(sections.iter().all(|s| s.kind == SectionKind::Paragraph));
    }

    #[test]
    fn consecutive_prose_lines_merge_into_one_paragraph() {
        let text = "First line of prose here.\nSecond line of prose here.\nThird one too.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].content,
            "First line of prose here. Second line of prose here. Third one too."
        );
    }

    #[test]
    fn heading_flushes_accumulated_paragraph() {
        let text = "Some prose sentence one.\nMETHODS\nMore prose after.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].kind, SectionKind::Paragraph);
        assert_eq!(sections[1].content, "METHODS");
        assert_eq!(sections[2].kind, SectionKind::Paragraph);
    }

    #[test]
    fn blank_lines_are_skipped_entirely() {
        let text = "INTRODUCTION\n\n\n\nBody text sentence here.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn page_advances_with_character_count() {
        // Two long prose blocks: the second starts past the divisor.
        let filler = "word ".repeat(30); // 150 chars per line, ends without '.'
        let mut text = String::new();
        for _ in 0..12 {
            text.push_str(&format!("{filler}line ends here.\n"));
        }
        let sections = parse_layout(&text, 1000);
        // One merged paragraph tagged with its starting page.
        assert_eq!(sections[0].page_number, 1);
    }

    #[test]
    fn form_feed_bumps_page_and_resets_counter() {
        let text = "First page prose sentence.\n\u{0C}Second page prose sentence.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections.len(), 1);
        // Both lines merge, but a fresh paragraph after the feed would be page 2:
        let text2 = "HEADING ONE\n\u{0C}HEADING TWO";
        let sections2 = parse_layout(text2, CHARS_PER_PAGE);
        assert_eq!(sections2[0].page_number, 1);
        assert_eq!(sections2[1].page_number, 2);
    }

    #[test]
    fn short_all_caps_noise_is_not_a_heading() {
        // 3 chars or fewer never qualify via the all-caps rule.
        let text = "DNA\nis a molecule studied here.";
        let sections = parse_layout(text, CHARS_PER_PAGE);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Paragraph);
    }

    #[test]
    fn empty_input_yields_no_sections() {
        assert!(parse_layout("", CHARS_PER_PAGE).is_empty());
        assert!(parse_layout("\n\n\n", CHARS_PER_PAGE).is_empty());
    }
}
