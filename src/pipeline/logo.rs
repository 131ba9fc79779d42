//! Logo detection: find non-content branding images among the extracted set.
//!
//! University crests, journal brands, and publisher marks get embedded in
//! papers and would look absurd dropped into a blog body. A vision call
//! classifies every extracted image at once; the response is a bare
//! comma-separated index list (or `-1`), addressed by original position
//! index.
//!
//! Every model-reported candidate is post-validated against structural
//! facts the model cannot be trusted with: a real logo lives on page 1 or
//! is small on both axes. Candidates failing that check — and indices
//! outside the image range — are discarded with a warning.
//!
//! Failures here are never fatal. A backend that cannot score images, a
//! transport error, or an unparseable response all degrade to "no logos
//! found" and the conversion proceeds.

use crate::backend::{GenerativeBackend, PromptPart};
use crate::config::ConversionConfig;
use crate::model::ExtractionResult;
use crate::prompts::build_logo_prompt;
use crate::ratelimit::RateLimiter;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identify logo images, returning their original position indices.
pub async fn detect_logos(
    extraction: &ExtractionResult,
    backend: &Arc<dyn GenerativeBackend>,
    limiter: &RateLimiter,
    config: &ConversionConfig,
) -> HashSet<usize> {
    if extraction.images.is_empty() {
        return HashSet::new();
    }
    if !backend.supports_image_scoring() {
        debug!(
            "backend '{}' does not score images; assuming no logos",
            backend.name()
        );
        return HashSet::new();
    }

    let mut parts = vec![PromptPart::text(build_logo_prompt(extraction))];
    for img in &extraction.images {
        parts.push(PromptPart::text(format!(
            "[Image {} from page {}]",
            img.position_index, img.page_number
        )));
        parts.push(PromptPart::png(img.data.clone()));
    }

    limiter.acquire().await;
    let response = match backend.generate(&parts, false).await {
        Ok(r) => r,
        Err(e) => {
            warn!("logo detection failed ({e}); assuming no logos");
            return HashSet::new();
        }
    };

    let candidates = parse_index_list(&response);
    validate_candidates(candidates, extraction, config)
}

/// Parse a comma-separated index response; `-1` (or junk) means none.
fn parse_index_list(response: &str) -> Vec<usize> {
    let trimmed = response.trim();
    if trimmed == "-1" {
        return Vec::new();
    }
    trimmed
        .split(',')
        .filter_map(|tok| {
            let tok = tok.trim();
            match tok.parse::<i64>() {
                Ok(n) if n >= 0 => Some(n as usize),
                Ok(_) => None,
                Err(_) => {
                    if !tok.is_empty() {
                        warn!("ignoring non-numeric logo token {tok:?}");
                    }
                    None
                }
            }
        })
        .collect()
}

/// Keep only candidates that are structurally plausible logos.
fn validate_candidates(
    candidates: Vec<usize>,
    extraction: &ExtractionResult,
    config: &ConversionConfig,
) -> HashSet<usize> {
    let mut accepted = HashSet::new();

    for idx in candidates {
        let Some(img) = extraction.images.get(idx) else {
            warn!(
                "discarding logo candidate {idx}: outside image range 0..{}",
                extraction.images.len()
            );
            continue;
        };

        let small = matches!(
            (img.width, img.height),
            (Some(w), Some(h)) if w < config.logo_max_dimension && h < config.logo_max_dimension
        );

        if img.page_number == 1 || small {
            accepted.insert(idx);
        } else {
            warn!(
                "discarding logo candidate {idx}: page {} and {}x{} too large for a logo",
                img.page_number,
                img.width.unwrap_or(0),
                img.height.unwrap_or(0)
            );
        }
    }

    debug!("logo detection accepted {} candidates", accepted.len());
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentInfo, ExtractedImage};

    fn extraction_with(images: Vec<(usize, u32, u32)>) -> ExtractionResult {
        let images = images
            .into_iter()
            .enumerate()
            .map(|(i, (page, w, h))| ExtractedImage {
                data: "AA==".into(),
                alt_text: format!("Image {i} from page {page}"),
                page_number: page,
                position_index: i,
                mime_type: "image/png".into(),
                width: Some(w),
                height: Some(h),
            })
            .collect();
        ExtractionResult {
            text: String::new(),
            images,
            metadata: DocumentInfo::default(),
            layout: Vec::new(),
        }
    }

    #[test]
    fn parses_comma_separated_indices() {
        assert_eq!(parse_index_list("0, 2,3"), vec![0, 2, 3]);
        assert_eq!(parse_index_list("-1"), Vec::<usize>::new());
        assert_eq!(parse_index_list("none of them"), Vec::<usize>::new());
    }

    #[test]
    fn first_page_candidate_accepted_regardless_of_size() {
        let extraction = extraction_with(vec![(1, 2000, 1500)]);
        let config = ConversionConfig::default();
        let set = validate_candidates(vec![0], &extraction, &config);
        assert!(set.contains(&0));
    }

    #[test]
    fn small_candidate_accepted_on_any_page() {
        let extraction = extraction_with(vec![(1, 500, 500), (4, 100, 100)]);
        let config = ConversionConfig::default();
        let set = validate_candidates(vec![1], &extraction, &config);
        assert!(set.contains(&1));
    }

    #[test]
    fn large_late_page_candidate_discarded() {
        let extraction = extraction_with(vec![(1, 100, 100), (3, 1000, 800)]);
        let config = ConversionConfig::default();
        let set = validate_candidates(vec![1], &extraction, &config);
        assert!(set.is_empty());
    }

    #[test]
    fn out_of_range_candidate_discarded() {
        let extraction = extraction_with(vec![(1, 100, 100)]);
        let config = ConversionConfig::default();
        let set = validate_candidates(vec![0, 7], &extraction, &config);
        assert_eq!(set, [0].into_iter().collect());
    }

    #[test]
    fn threshold_is_strict() {
        // Exactly 300px on one axis is not "under 300".
        let extraction = extraction_with(vec![(2, 300, 100)]);
        let config = ConversionConfig::default();
        let set = validate_candidates(vec![0], &extraction, &config);
        assert!(set.is_empty());
    }
}
