//! Prompt construction for every generative-backend call.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tuning the conversion instructions or
//!    the logo criteria means editing exactly one place.
//!
//! 2. **Testability** — unit tests inspect the assembled prompt text
//!    directly without spinning up a real backend, so a regression in page
//!    markers or logo exclusions is caught cheaply.
//!
//! Four call shapes exist: the main blog conversion (full JSON contract),
//! logo detection (bare index list), thumbnail ranking (bare index), and
//! author extraction (small JSON array).

use crate::model::{ExtractionResult, SectionKind};
use crate::pipeline::language::Language;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Build the main conversion prompt.
///
/// Embeds source metadata, the output-language directive, the content
/// rules, the enumerated image list (with logo images explicitly excluded),
/// the serialized layout, and the JSON output contract. Sections whose
/// `images` arrays the model returns must use 0-based positions into the
/// ORIGINAL image sequence — the logo set is excluded by instruction, not
/// by renumbering.
pub fn build_conversion_prompt(
    extraction: &ExtractionResult,
    image_urls: &[String],
    logo_indices: &HashSet<usize>,
    language: Language,
) -> String {
    let meta = &extraction.metadata;
    let mut p = String::with_capacity(extraction.text.len() / 2 + 2048);

    p.push_str("You are an expert science communicator. Convert the academic paper below into an engaging, accessible blog post.\n\n");

    writeln!(p, "SOURCE DOCUMENT").ok();
    writeln!(p, "- Title: {}", meta.title).ok();
    writeln!(p, "- Author: {}", meta.author).ok();
    writeln!(p, "- Pages: {}", meta.page_count).ok();
    writeln!(p, "- Layout sections: {}", extraction.layout.len()).ok();
    writeln!(p, "- Available images: {}", extraction.images.len()).ok();
    writeln!(p, "- Detected language: {}", language).ok();
    p.push('\n');

    writeln!(p, "OUTPUT LANGUAGE: write the entire blog post in {}.", language).ok();
    p.push('\n');

    p.push_str(
        "CONTENT REQUIREMENTS\n\
         1. A captivating title, at most 60 characters.\n\
         2. A summary of 2-3 sentences that hooks the reader.\n\
         3. A body organised into sections, each with a heading and HTML content.\n\
         4. 5-8 topical tags.\n\
         5. Allowed HTML tags in section content: <p>, <strong>, <em>, <ul>, <ol>, <li>, <blockquote>, <code>. No other tags.\n\
         6. Explain jargon; keep the science accurate but readable.\n\n",
    );

    if !extraction.images.is_empty() {
        p.push_str("AVAILABLE IMAGES\n");
        for img in &extraction.images {
            let url = image_urls
                .get(img.position_index)
                .map(String::as_str)
                .unwrap_or("pending upload");
            if logo_indices.contains(&img.position_index) {
                writeln!(
                    p,
                    "Image {}: page {}, {} — LOGO, DO NOT include in content",
                    img.position_index, img.page_number, url
                )
                .ok();
            } else {
                writeln!(
                    p,
                    "Image {}: page {}, {}",
                    img.position_index, img.page_number, url
                )
                .ok();
            }
        }
        p.push_str(
            "\nAssign each non-logo image to the section it best illustrates by putting its \
             number in that section's \"images\" array. Numbers refer to the list above.\n\n",
        );
    }

    p.push_str("PAPER CONTENT\n");
    p.push_str(&serialize_layout(extraction));
    p.push('\n');

    p.push_str(
        "OUTPUT FORMAT\n\
         Respond with a single JSON object and nothing else:\n\
         {\n\
           \"title\": \"...\",\n\
           \"summary\": \"...\",\n\
           \"tags\": [\"...\"],\n\
           \"sections\": [\n\
             { \"heading\": \"...\", \"content\": \"<p>...</p>\", \"images\": [0] }\n\
           ]\n\
         }\n\
         \"images\" entries are 0-based positions into the image list above.\n",
    );

    p
}

/// Serialize the layout into prompt text: `--- Page N ---` markers whenever
/// the estimated page advances, `## ` prefixes for headings.
pub fn serialize_layout(extraction: &ExtractionResult) -> String {
    let mut out = String::with_capacity(extraction.text.len() + 256);
    let mut current_page = 0usize;

    for section in &extraction.layout {
        if section.page_number > current_page {
            current_page = section.page_number;
            writeln!(out, "--- Page {current_page} ---").ok();
        }
        match section.kind {
            SectionKind::Heading => {
                writeln!(out, "## {}", section.content).ok();
            }
            SectionKind::Paragraph => {
                writeln!(out, "{}", section.content).ok();
            }
        }
    }

    out
}

/// Build the logo-detection instruction sent alongside every image.
///
/// The "not a logo" contrast list matters: without it vision models flag
/// author portraits and small diagrams as branding.
pub fn build_logo_prompt(extraction: &ExtractionResult) -> String {
    let mut p = String::from(
        "You will be shown every image extracted from an academic paper. Identify which of \
         them are LOGOS: university crests, journal brands, publisher marks, conference \
         banners, watermarks.\n\n\
         NOT logos: author photos, charts, graphs, diagrams, experiment photos, equations, \
         maps, or any figure that carries content.\n\nIMAGE METADATA\n",
    );

    for img in &extraction.images {
        let dims = match (img.width, img.height) {
            (Some(w), Some(h)) => format!("{w}x{h}px"),
            _ => "unknown size".to_string(),
        };
        writeln!(
            p,
            "Image {}: page {}, {}",
            img.position_index, img.page_number, dims
        )
        .ok();
    }

    p.push_str(
        "\nRespond with ONLY the image numbers that are logos, comma-separated \
         (for example: 0,3). If none are logos, respond with -1.\n",
    );
    p
}

/// Build the thumbnail-ranking instruction.
pub fn build_thumbnail_prompt(title: &str, summary: &str, image_count: usize) -> String {
    format!(
        "A blog post titled \"{title}\" with this summary:\n\n{summary}\n\n\
         You will be shown {image_count} candidate images. Pick the single image that would \
         make the most compelling thumbnail: visually striking, representative of the topic, \
         readable at small sizes.\n\n\
         Respond with ONLY the number of the best image.\n"
    )
}

/// Build the author-extraction instruction for the leading document text.
pub fn build_author_prompt(text_sample: &str) -> String {
    format!(
        "Extract the authors of this academic paper from the text below.\n\n\
         Look for explicit \"Author:\" or \"By:\" labels, names in the typical author \
         position under the title, and names adjacent to email addresses or institutional \
         affiliations.\n\n\
         Respond with ONLY a JSON array of at most 10 entries, ordered by confidence \
         descending:\n\
         [{{\"name\": \"...\", \"affiliation\": \"...\", \"email\": \"...\", \"confidence\": 95}}]\n\
         \"affiliation\" and \"email\" may be omitted when unknown. \"confidence\" is 0-100.\n\n\
         TEXT\n{text_sample}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentInfo, ExtractedImage, LayoutSection};

    fn sample_extraction() -> ExtractionResult {
        ExtractionResult {
            text: "body".into(),
            images: vec![
                ExtractedImage {
                    data: "AA==".into(),
                    alt_text: "Image 0 from page 1".into(),
                    page_number: 1,
                    position_index: 0,
                    mime_type: "image/png".into(),
                    width: Some(120),
                    height: Some(80),
                },
                ExtractedImage {
                    data: "AA==".into(),
                    alt_text: "Image 1 from page 2".into(),
                    page_number: 2,
                    position_index: 1,
                    mime_type: "image/png".into(),
                    width: Some(1000),
                    height: Some(700),
                },
            ],
            metadata: DocumentInfo {
                title: "Quantum Widgets".into(),
                author: "A. Researcher".into(),
                page_count: 8,
                creation_date: None,
                author_detection: None,
            },
            layout: vec![
                LayoutSection {
                    kind: SectionKind::Heading,
                    content: "INTRODUCTION".into(),
                    heading_level: Some(1),
                    page_number: 1,
                },
                LayoutSection {
                    kind: SectionKind::Paragraph,
                    content: "Widgets are interesting.".into(),
                    heading_level: None,
                    page_number: 1,
                },
                LayoutSection {
                    kind: SectionKind::Paragraph,
                    content: "More on page two.".into(),
                    heading_level: None,
                    page_number: 2,
                },
            ],
        }
    }

    #[test]
    fn conversion_prompt_marks_logos() {
        let extraction = sample_extraction();
        let logos: HashSet<usize> = [0].into_iter().collect();
        let prompt = build_conversion_prompt(&extraction, &[], &logos, Language::English);

        assert!(prompt.contains("Image 0: page 1, pending upload — LOGO, DO NOT include"));
        assert!(prompt.contains("Image 1: page 2, pending upload\n"));
        assert!(!prompt.contains("Image 1: page 2, pending upload — LOGO"));
    }

    #[test]
    fn conversion_prompt_uses_assigned_urls() {
        let extraction = sample_extraction();
        let urls = vec![
            "https://cdn.example/a.png".to_string(),
            "https://cdn.example/b.png".to_string(),
        ];
        let prompt =
            build_conversion_prompt(&extraction, &urls, &HashSet::new(), Language::Indonesian);
        assert!(prompt.contains("https://cdn.example/b.png"));
        assert!(prompt.contains("Indonesian"));
    }

    #[test]
    fn layout_serialization_inserts_page_markers_on_advance() {
        let extraction = sample_extraction();
        let text = serialize_layout(&extraction);

        assert!(text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.contains("## INTRODUCTION"));
        // One marker per page, not per section.
        assert_eq!(text.matches("--- Page 1 ---").count(), 1);
    }

    #[test]
    fn logo_prompt_lists_dimensions() {
        let extraction = sample_extraction();
        let prompt = build_logo_prompt(&extraction);
        assert!(prompt.contains("Image 0: page 1, 120x80px"));
        assert!(prompt.contains("respond with -1"));
    }

    #[test]
    fn thumbnail_prompt_embeds_title() {
        let p = build_thumbnail_prompt("T", "S", 3);
        assert!(p.contains("\"T\""));
        assert!(p.contains("3 candidate images"));
    }

    #[test]
    fn author_prompt_requests_json_array() {
        let p = build_author_prompt("By: Jane Doe");
        assert!(p.contains("JSON array"));
        assert!(p.contains("By: Jane Doe"));
    }
}
