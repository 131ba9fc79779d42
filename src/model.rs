//! Data model for the extraction and conversion pipeline.
//!
//! Data flows strictly forward: raw PDF bytes → [`ExtractionResult`] →
//! [`BlogConversionResult`]. Each stage builds a new immutable structure;
//! nothing mutates a prior stage's output in place. All entities live for
//! one upload request and are discarded once the response is produced.
//!
//! ## The position-index invariant
//!
//! [`ExtractedImage::position_index`] must equal the element's index in
//! `ExtractionResult::images` at all times. It is the stable identifier for
//! "the same image" across prompting, logo filtering, and final HTML
//! rendering. Logo reconciliation therefore *filters* section image arrays
//! and never renumbers the survivors — the `{{IMAGE_i}}` placeholders and
//! the AI-facing prompt both address images by original position.

use serde::{Deserialize, Serialize};

/// Everything the pipeline pulled out of one uploaded PDF.
///
/// Created once per upload and immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Full linearized text of the document.
    pub text: String,
    /// Embedded raster images in discovery order (page-major).
    pub images: Vec<ExtractedImage>,
    /// Document-level metadata.
    pub metadata: DocumentInfo,
    /// Ordered narrative structure of the text.
    pub layout: Vec<LayoutSection>,
}

/// Document-level metadata read from the PDF info dictionary, augmented
/// with the author-detection result when detection ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_detection: Option<AuthorDetectionResult>,
}

/// One embedded raster image, re-encoded as PNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Base64-encoded PNG bytes.
    pub data: String,
    /// Human-readable label, "Image {position_index} from page {page}".
    pub alt_text: String,
    /// 1-based source page number.
    pub page_number: usize,
    /// 0-based discovery order across the whole document.
    ///
    /// Invariant: equals this element's index in the owning `images` vec.
    pub position_index: usize,
    /// Always "image/png" after re-encoding.
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Whether a layout section is a heading or body prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Heading,
    Paragraph,
}

/// One contiguous heading or paragraph unit in the linearized text,
/// tagged with an estimated page number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSection {
    pub kind: SectionKind,
    pub content: String,
    /// 1–3, present only for headings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    /// Estimated 1-based page (character-count heuristic, not authoritative).
    pub page_number: usize,
}

/// Which strategy produced the detected authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorSource {
    Metadata,
    AiExtraction,
    Both,
}

/// A single detected author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 0–100; metadata-parsed authors carry a fixed 70.
    pub confidence: u8,
}

/// Merged author-detection output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDetectionResult {
    /// Ordered by confidence descending; at most `max_authors` entries.
    pub authors: Vec<DetectedAuthor>,
    pub source: AuthorSource,
    /// Merged count before truncation.
    pub total_authors_found: usize,
}

/// The final structured blog record produced by the orchestrator.
///
/// `content` still contains `{{IMAGE_i}}` placeholders; the caller
/// substitutes them with the i-th entry of `image_urls` once final URLs are
/// known. The literal double-brace syntax is contractual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConversionResult {
    pub title: String,
    /// Rendered HTML with image placeholders already substituted in
    /// positionally (`{{IMAGE_<position_index>}}`).
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub sections: Vec<BlogSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// First detected logo URL, kept for callers that want exactly one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_urls: Option<Vec<String>>,
}

/// One prose section of the generated blog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSection {
    pub heading: String,
    /// HTML fragment (restricted tag set enforced by the prompt).
    pub content: String,
    /// Position indices into the ORIGINAL extracted-image sequence —
    /// never into a logo-filtered subsequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<usize>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SectionKind::Heading).unwrap(),
            "\"heading\""
        );
    }

    #[test]
    fn author_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuthorSource::AiExtraction).unwrap(),
            "\"ai_extraction\""
        );
    }

    #[test]
    fn blog_section_images_default_to_none() {
        let s: BlogSection =
            serde_json::from_str(r#"{"heading":"H","content":"<p>x</p>"}"#).unwrap();
        assert!(s.images.is_none());
    }
}
