//! HTML assembly: blog sections → body markup with image placeholders.
//!
//! The rendered body references images through literal `{{IMAGE_i}}`
//! placeholders, where `i` is the image's ORIGINAL position index. The
//! caller substitutes placeholders with final URLs after upload; the
//! double-brace syntax is part of this crate's output contract and must
//! not change.
//!
//! Logo reconciliation happens here by *filtering* each section's image
//! list against the logo set. Indices are never renumbered — a section
//! that referenced images {0,1,2,3} with logos {1,3} renders placeholders
//! for 0 and 2, still under those numbers.

use crate::model::BlogSection;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Remove logo indices from every section's image list, in place,
/// preserving the order and numbering of survivors.
pub fn reconcile_logos(sections: &mut [BlogSection], logo_indices: &HashSet<usize>) {
    if logo_indices.is_empty() {
        return;
    }
    for section in sections.iter_mut() {
        if let Some(images) = section.images.as_mut() {
            images.retain(|idx| !logo_indices.contains(idx));
        }
    }
}

/// Render the blog body: one `<h2>`/`<div>` pair per section, followed by
/// an `<img>` placeholder per surviving image reference.
pub fn render_html(sections: &[BlogSection]) -> String {
    let mut html = String::new();

    for section in sections {
        write!(
            html,
            "<h2>{}</h2><div>{}</div>",
            section.heading, section.content
        )
        .ok();

        if let Some(images) = &section.images {
            for idx in images {
                write!(
                    html,
                    r#"<img src="{{{{IMAGE_{idx}}}}}" alt="Article illustration" class="blog-image"/>"#
                )
                .ok();
            }
        }
    }

    html
}

/// Pick the default thumbnail: the first uploaded URL whose position index
/// is not a logo.
pub fn default_thumbnail(
    image_urls: &[String],
    logo_indices: &HashSet<usize>,
) -> Option<String> {
    image_urls
        .iter()
        .enumerate()
        .find(|(idx, _)| !logo_indices.contains(idx))
        .map(|(_, url)| url.clone())
}
