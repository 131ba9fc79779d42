//! Orchestration entry points: extraction, conversion, thumbnail choice.
//!
//! Steps inside one conversion run strictly in sequence because each
//! depends on the previous step's output: logo indices feed the prompt,
//! the prompt feeds the backend call, the parsed response feeds HTML
//! rendering. Across requests the only shared state is the injected
//! [`RateLimiter`], which spaces backend calls process-wide.
//!
//! ## Failure semantics
//!
//! * Validation rejection and an unparseable conversion response are
//!   fatal — the caller gets one descriptive error and no partial result.
//! * Logo detection, thumbnail ranking, and author detection degrade
//!   gracefully (no logos / first image / metadata-only) because they are
//!   enhancements, not deliverables.
//! * Per-page and per-image extraction problems are logged and skipped.

use crate::backend::{GenerativeBackend, PromptPart};
use crate::config::ConversionConfig;
use crate::error::Paper2BlogError;
use crate::model::{
    BlogConversionResult, DocumentInfo, ExtractedImage, ExtractionResult,
};
use crate::pipeline::{authors, images, language, layout, logo, parse, render, validate};
use crate::prompts::{build_conversion_prompt, build_thumbnail_prompt};
use crate::ratelimit::RateLimiter;
use crate::storage::{self, ObjectStorage};
use pdfium_render::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extract text, layout, images, and metadata from a PDF byte buffer.
///
/// Fails fast with [`Paper2BlogError::RejectedInput`] when the document
/// does not look like an academic paper, before any image or backend work
/// happens. Author detection runs when a backend is supplied and is never
/// fatal here.
pub async fn extract(
    pdf_bytes: &[u8],
    backend: Option<&Arc<dyn GenerativeBackend>>,
    limiter: &RateLimiter,
    config: &ConversionConfig,
) -> Result<ExtractionResult, Paper2BlogError> {
    info!("starting extraction: {} bytes", pdf_bytes.len());

    // ── Step 1: Linearize text and read the info dictionary ──────────────
    let bytes = pdf_bytes.to_vec();
    let password = config.password.clone();
    let (text, mut metadata) =
        tokio::task::spawn_blocking(move || read_document_blocking(&bytes, password.as_deref()))
            .await
            .map_err(|e| Paper2BlogError::Internal(format!("read task panicked: {e}")))??;

    // ── Step 2: Validate academic form before any expensive work ─────────
    validate::validate_journal(&text)
        .map_err(|reason| Paper2BlogError::RejectedInput { reason })?;

    // ── Step 3: Recover narrative structure ──────────────────────────────
    let layout = layout::parse_layout(&text, config.chars_per_page);
    debug!("layout: {} sections", layout.len());

    // ── Step 4: Pull embedded images ─────────────────────────────────────
    let extracted_images = images::extract_images(pdf_bytes, config).await?;

    // ── Step 5: Detect authors (non-fatal) ───────────────────────────────
    let metadata_author = (!metadata.author.trim().is_empty()).then(|| metadata.author.clone());
    match authors::detect_authors(&text, metadata_author.as_deref(), backend, limiter, config)
        .await
    {
        Ok(detection) => {
            if !detection.authors.is_empty() {
                metadata.author = authors::format_authors(&detection.authors);
            }
            metadata.author_detection = Some(detection);
        }
        Err(e) => warn!("author detection unavailable: {e}"),
    }

    info!(
        "extraction complete: {} chars, {} sections, {} images",
        text.chars().count(),
        layout.len(),
        extracted_images.len()
    );

    Ok(ExtractionResult {
        text,
        images: extracted_images,
        metadata,
        layout,
    })
}

/// Convert an extraction into a structured blog post.
///
/// `image_urls` holds the uploaded URL for each extracted image, in
/// position-index order (see [`crate::storage::upload_images`]). The
/// returned `content` still carries `{{IMAGE_i}}` placeholders for the
/// caller to substitute.
pub async fn convert_to_blog(
    extraction: &ExtractionResult,
    image_urls: &[String],
    backend: &Arc<dyn GenerativeBackend>,
    limiter: &RateLimiter,
    config: &ConversionConfig,
) -> Result<BlogConversionResult, Paper2BlogError> {
    // ── Step 1: Logo detection (enhancement, never fatal) ────────────────
    let logo_indices: HashSet<usize> =
        if !extraction.images.is_empty() && !image_urls.is_empty() {
            logo::detect_logos(extraction, backend, limiter, config).await
        } else {
            HashSet::new()
        };

    // ── Step 2: Language detection ───────────────────────────────────────
    let lang = language::detect_language(&extraction.text, config.language_sample_chars);

    // ── Step 3: Prompt + multi-part request assembly ─────────────────────
    let prompt = build_conversion_prompt(extraction, image_urls, &logo_indices, lang);
    let mut parts = vec![PromptPart::text(prompt)];
    let mut inlined = 0usize;
    for img in &extraction.images {
        if logo_indices.contains(&img.position_index) {
            continue;
        }
        if inlined >= config.max_prompt_images {
            debug!("image inlining capped at {}", config.max_prompt_images);
            break;
        }
        parts.push(PromptPart::text(format!(
            "[Image {} from page {}]",
            img.position_index, img.page_number
        )));
        parts.push(PromptPart::png(img.data.clone()));
        inlined += 1;
    }

    // ── Step 4: Invoke the backend (fatal on failure) ────────────────────
    limiter.acquire().await;
    let response = backend.generate(&parts, true).await?;

    // ── Step 5: Parse with repair (fatal on failure) ─────────────────────
    let parsed = parse::parse_blog_response(&response)?;

    // ── Step 6: Logo reconciliation + HTML rendering ─────────────────────
    let mut sections = parsed.sections();
    render::reconcile_logos(&mut sections, &logo_indices);
    let content = render::render_html(&sections);

    // ── Step 7: Thumbnail + logo URLs ────────────────────────────────────
    let thumbnail_url = render::default_thumbnail(image_urls, &logo_indices);

    let mut logo_positions: Vec<usize> = logo_indices.iter().copied().collect();
    logo_positions.sort_unstable();
    let logo_urls: Vec<String> = logo_positions
        .iter()
        .filter_map(|&idx| image_urls.get(idx).cloned())
        .collect();

    info!(
        "conversion complete: {} sections, {} logos, language {lang}",
        sections.len(),
        logo_urls.len()
    );

    Ok(BlogConversionResult {
        title: parsed.title(),
        content,
        summary: parsed.summary(),
        tags: parsed.tags(),
        sections,
        image_urls: (!image_urls.is_empty()).then(|| image_urls.to_vec()),
        thumbnail_url,
        logo_url: logo_urls.first().cloned(),
        logo_urls: (!logo_urls.is_empty()).then_some(logo_urls),
    })
}

/// Ask the backend which image makes the best thumbnail.
///
/// Skips the call entirely for zero or one image, and falls back to the
/// first URL on any backend trouble — thumbnail choice is never worth
/// failing a conversion over.
pub async fn select_best_thumbnail(
    title: &str,
    summary: &str,
    images: &[ExtractedImage],
    image_urls: &[String],
    backend: &Arc<dyn GenerativeBackend>,
    limiter: &RateLimiter,
) -> Option<String> {
    if images.is_empty() || image_urls.is_empty() {
        return None;
    }
    if images.len() == 1 {
        return image_urls.first().cloned();
    }
    if !backend.supports_image_scoring() {
        return image_urls.first().cloned();
    }

    let mut parts = vec![PromptPart::text(build_thumbnail_prompt(
        title,
        summary,
        images.len(),
    ))];
    for img in images {
        parts.push(PromptPart::text(format!(
            "[Image {} from page {}]",
            img.position_index, img.page_number
        )));
        parts.push(PromptPart::png(img.data.clone()));
    }

    limiter.acquire().await;
    let index = match backend.generate(&parts, false).await {
        Ok(response) => match response.trim().parse::<usize>() {
            Ok(idx) if idx < image_urls.len() => idx,
            Ok(idx) => {
                warn!("thumbnail index {idx} out of range; falling back to first image");
                0
            }
            Err(_) => {
                warn!(
                    "non-numeric thumbnail response {:?}; falling back to first image",
                    response.trim()
                );
                0
            }
        },
        Err(e) => {
            warn!("thumbnail ranking failed ({e}); falling back to first image");
            0
        }
    };

    image_urls.get(index).cloned()
}

/// Full pipeline convenience: extract, upload, convert, pick thumbnail.
///
/// Placeholder substitution in `content` is still the caller's job — it
/// is deliberately left out so callers can post-process section HTML
/// before committing to final URLs.
pub async fn process(
    pdf_bytes: &[u8],
    backend: &Arc<dyn GenerativeBackend>,
    store: &Arc<dyn ObjectStorage>,
    limiter: &RateLimiter,
    config: &ConversionConfig,
) -> Result<BlogConversionResult, Paper2BlogError> {
    let extraction = extract(pdf_bytes, Some(backend), limiter, config).await?;
    let image_urls = storage::upload_images(store, &extraction.images).await?;
    let mut result = convert_to_blog(&extraction, &image_urls, backend, limiter, config).await?;

    if let Some(best) = select_best_thumbnail(
        &result.title,
        &result.summary,
        &extraction.images,
        &image_urls,
        backend,
        limiter,
    )
    .await
    {
        result.thumbnail_url = Some(best);
    }

    Ok(result)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Blocking read of the document text and info dictionary.
///
/// Pages are joined with a form feed so the layout parser sees real page
/// boundaries instead of relying purely on its character estimate. A page
/// whose text cannot be read is skipped with a warning.
fn read_document_blocking(
    bytes: &[u8],
    password: Option<&str>,
) -> Result<(String, DocumentInfo), Paper2BlogError> {
    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| Paper2BlogError::ExtractionFailed {
            detail: format!("could not open PDF: {e:?}"),
        })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;

    let mut text = String::new();
    for page_index in 0..pages.len() {
        let page = match pages.get(page_index) {
            Ok(p) => p,
            Err(e) => {
                warn!("skipping text of page {}: {e:?}", page_index + 1);
                continue;
            }
        };
        match page.text() {
            Ok(page_text) => {
                if page_index > 0 {
                    text.push('\u{0C}');
                    text.push('\n');
                }
                text.push_str(&page_text.all());
            }
            Err(e) => warn!("skipping text of page {}: {e:?}", page_index + 1),
        };
    }

    let doc_metadata = document.metadata();
    let get_tag = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        doc_metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            (!v.is_empty()).then_some(v)
        })
    };

    let info = DocumentInfo {
        title: get_tag(PdfDocumentMetadataTagType::Title).unwrap_or_default(),
        author: get_tag(PdfDocumentMetadataTagType::Author).unwrap_or_default(),
        page_count,
        creation_date: get_tag(PdfDocumentMetadataTagType::CreationDate),
        author_detection: None,
    };

    Ok((text, info))
}
