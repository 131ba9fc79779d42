//! Embedded-image extraction: walk each page's object list and pull out
//! raster images as PNG records.
//!
//! ## Why spawn_blocking?
//!
//! pdfium wraps a C++ library with thread-local state and is not safe to
//! call from async contexts. The whole walk runs on a blocking-pool thread;
//! the async wrapper bounds it with a timeout scaled by page count so one
//! pathological document cannot hang an upload forever.
//!
//! ## Failure policy
//!
//! Per-image and per-page failures are logged and skipped — the function
//! returns whatever succeeded, possibly nothing. Only a document that
//! cannot be opened at all is fatal. Records stream over a channel as they
//! are produced, so even a timeout returns the images extracted before the
//! deadline rather than discarding them.
//!
//! ## The position-index invariant
//!
//! `position_index` is assigned by append order across the whole document
//! (page-major), never per page, and always equals the record's index in
//! the returned vec. Downstream logo filtering, prompting, and placeholder
//! substitution all address images by this index, and `alt_text` carries
//! the same 0-based number.

use crate::config::ConversionConfig;
use crate::error::Paper2BlogError;
use crate::model::ExtractedImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::sync::mpsc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Extract every embedded raster image from the PDF, in discovery order.
///
/// Never fails on a per-image or per-page basis; returns `Err` only when
/// the document itself cannot be opened. On overall timeout the walk is
/// abandoned with a warning and whatever was extracted up to that point is
/// returned.
pub async fn extract_images(
    pdf_bytes: &[u8],
    config: &ConversionConfig,
) -> Result<Vec<ExtractedImage>, Paper2BlogError> {
    let bytes = pdf_bytes.to_vec();
    let password = config.password.clone();

    // Budget: the configured per-page bound times a conservative page
    // estimate; resolution inside pdfium is synchronous, so the bound is
    // enforced on the whole blocking pass rather than per object.
    let estimated_pages = (bytes.len() / 4096).clamp(1, 500);
    let budget = config.image_resolve_timeout * estimated_pages as u32;

    let (tx, rx) = mpsc::channel();
    let task = tokio::task::spawn_blocking(move || {
        extract_images_blocking(&bytes, password.as_deref(), tx)
    });

    collect_bounded(task, rx, budget).await
}

/// Collect streamed records until the walk finishes or the budget expires.
///
/// On timeout the channel is drained and the salvaged prefix returned; the
/// abandoned blocking task notices its closed receiver and stops.
async fn collect_bounded(
    task: JoinHandle<Result<(), Paper2BlogError>>,
    rx: mpsc::Receiver<ExtractedImage>,
    budget: Duration,
) -> Result<Vec<ExtractedImage>, Paper2BlogError> {
    match timeout(budget, task).await {
        Ok(joined) => {
            joined.map_err(|e| {
                Paper2BlogError::Internal(format!("image extraction task panicked: {e}"))
            })??;
            Ok(rx.try_iter().collect())
        }
        Err(_) => {
            let salvaged: Vec<ExtractedImage> = rx.try_iter().collect();
            warn!(
                "image extraction exceeded {:?}; keeping the {} images extracted so far",
                budget,
                salvaged.len()
            );
            Ok(salvaged)
        }
    }
}

/// Blocking implementation of the page-object walk. Sends each record as
/// soon as it is ready; a closed receiver means the caller gave up.
fn extract_images_blocking(
    bytes: &[u8],
    password: Option<&str>,
    tx: mpsc::Sender<ExtractedImage>,
) -> Result<(), Paper2BlogError> {
    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| Paper2BlogError::ExtractionFailed {
            detail: format!("could not open PDF: {e:?}"),
        })?;

    let pages = document.pages();
    let page_count = pages.len();
    let mut extracted = 0usize;

    for page_index in 0..page_count {
        let page_number = page_index as usize + 1;

        let page = match pages.get(page_index) {
            Ok(p) => p,
            Err(e) => {
                warn!("skipping page {page_number}: could not load page: {e:?}");
                continue;
            }
        };

        for object in page.objects().iter() {
            let PdfPageObject::Image(ref image_object) = object else {
                continue;
            };

            let raw = match image_object.get_raw_image() {
                Ok(img) => img,
                Err(e) => {
                    warn!(
                        "skipping image on page {page_number}: pixel data unavailable: {e:?}"
                    );
                    continue;
                }
            };

            let (width, height) = (raw.width(), raw.height());
            if width == 0 || height == 0 {
                warn!("skipping image on page {page_number}: zero-sized");
                continue;
            }

            let rgba = normalize_pixels(raw);

            let mut png = Vec::new();
            if let Err(e) = DynamicImage::ImageRgba8(rgba)
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            {
                warn!("skipping image on page {page_number}: PNG encoding failed: {e}");
                continue;
            }

            debug!(
                "extracted image {extracted}: page {page_number}, {width}x{height}, {} PNG bytes",
                png.len()
            );

            let record = image_record(extracted, page_number, width, height, &png);
            extracted += 1;
            if tx.send(record).is_err() {
                return Ok(());
            }
        }
    }

    debug!("extracted {extracted} images from {page_count} pages");
    Ok(())
}

/// Assemble one image record. The 0-based `position_index` is the image's
/// identity everywhere downstream, including the `alt_text` label.
fn image_record(
    position_index: usize,
    page_number: usize,
    width: u32,
    height: u32,
    png: &[u8],
) -> ExtractedImage {
    ExtractedImage {
        data: STANDARD.encode(png),
        alt_text: format!("Image {position_index} from page {page_number}"),
        page_number,
        position_index,
        mime_type: "image/png".to_string(),
        width: Some(width),
        height: Some(height),
    }
}

/// Reinterpret a raw pixel buffer into RGBA according to its declared
/// color-space kind: grayscale replicates to RGB with opaque alpha, RGB
/// gains an opaque alpha channel, RGBA passes through verbatim. Exotic
/// formats (16-bit, CMYK conversions already mapped by pdfium) fall back
/// to the generic conversion.
fn normalize_pixels(raw: DynamicImage) -> RgbaImage {
    match raw {
        DynamicImage::ImageLuma8(gray) => {
            let (w, h) = gray.dimensions();
            let mut out = RgbaImage::new(w, h);
            for (x, y, p) in gray.enumerate_pixels() {
                let v = p.0[0];
                out.put_pixel(x, y, image::Rgba([v, v, v, 255]));
            }
            out
        }
        DynamicImage::ImageRgb8(rgb) => {
            let (w, h) = rgb.dimensions();
            let mut out = RgbaImage::new(w, h);
            for (x, y, p) in rgb.enumerate_pixels() {
                let [r, g, b] = p.0;
                out.put_pixel(x, y, image::Rgba([r, g, b, 255]));
            }
            out
        }
        DynamicImage::ImageRgba8(rgba) => rgba,
        other => other.to_rgba8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba};

    #[test]
    fn grayscale_replicates_to_rgb_with_opaque_alpha() {
        let gray = GrayImage::from_pixel(2, 2, Luma([120]));
        let rgba = normalize_pixels(DynamicImage::ImageLuma8(gray));
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([120, 120, 120, 255]));
    }

    #[test]
    fn rgb_gains_opaque_alpha() {
        let rgb = RgbImage::from_pixel(3, 1, Rgb([10, 20, 30]));
        let rgba = normalize_pixels(DynamicImage::ImageRgb8(rgb));
        assert_eq!(rgba.get_pixel(2, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn rgba_passes_through_verbatim() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let rgba = normalize_pixels(DynamicImage::ImageRgba8(src.clone()));
        assert_eq!(rgba, src);
    }

    #[test]
    fn sixteen_bit_falls_back_to_generic_conversion() {
        let wide = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_pixel(1, 1, Luma([65535u16]));
        let rgba = normalize_pixels(DynamicImage::ImageLuma16(wide));
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn record_labels_carry_the_position_index() {
        let r = image_record(0, 2, 10, 10, &[1, 2, 3]);
        assert_eq!(r.alt_text, "Image 0 from page 2");
        assert_eq!(r.position_index, 0);
        assert_eq!(r.mime_type, "image/png");
        assert_eq!((r.width, r.height), (Some(10), Some(10)));
    }

    #[tokio::test]
    async fn collected_images_keep_position_order() {
        let (tx, rx) = mpsc::channel();
        let task = tokio::task::spawn_blocking(move || {
            for i in 0..4 {
                tx.send(image_record(i, i / 2 + 1, 8, 8, b"png")).unwrap();
            }
            Ok::<(), Paper2BlogError>(())
        });

        let images = collect_bounded(task, rx, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(images.len(), 4);
        for (k, img) in images.iter().enumerate() {
            assert_eq!(img.position_index, k);
        }
    }

    #[tokio::test]
    async fn timeout_keeps_images_extracted_before_the_deadline() {
        let (tx, rx) = mpsc::channel();
        let task = tokio::task::spawn_blocking(move || {
            tx.send(image_record(0, 1, 8, 8, b"png")).unwrap();
            tx.send(image_record(1, 1, 8, 8, b"png")).unwrap();
            std::thread::sleep(Duration::from_millis(500));
            let _ = tx.send(image_record(2, 2, 8, 8, b"png"));
            Ok::<(), Paper2BlogError>(())
        });

        let images = collect_bounded(task, rx, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].position_index, 0);
        assert_eq!(images[1].position_index, 1);
    }
}
