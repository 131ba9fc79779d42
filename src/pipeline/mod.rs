//! Pipeline stages for PDF-to-blog conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap an
//! implementation (a different extraction backend, another heuristic)
//! without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! pdf bytes ──▶ validate ──▶ layout ──▶ images ──▶ authors
//!                  │                                  │
//!                  ▼                                  ▼
//!               reject                        ExtractionResult
//!                                                     │
//!                      logo ──▶ language ──▶ prompt ──▶ parse ──▶ render
//! ```
//!
//! 1. [`validate`]  — score raw text against academic-paper signals; cheap
//!    rejection before any expensive work
//! 2. [`layout`]    — turn linearized text into typed heading/paragraph
//!    sections with estimated page numbers
//! 3. [`images`]    — walk each page's object list, pull embedded rasters,
//!    re-encode as PNG; runs in `spawn_blocking` because pdfium is not
//!    async-safe
//! 4. [`authors`]   — metadata parsing merged with AI extraction
//! 5. [`logo`]      — vision call identifying non-content branding images
//! 6. [`language`]  — Indonesian/English keyword sniffing for the output
//!    directive
//! 7. [`parse`]     — JSON parse with a truncation-repair pass; the only
//!    stage allowed to reject a backend response
//! 8. [`render`]    — section HTML assembly with `{{IMAGE_i}}` placeholders

pub mod authors;
pub mod images;
pub mod language;
pub mod layout;
pub mod logo;
pub mod parse;
pub mod render;
pub mod validate;
