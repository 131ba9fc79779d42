//! # paper2blog
//!
//! Turn academic PDF papers into structured, illustrated blog posts using
//! vision language models (VLMs).
//!
//! ## Why this crate?
//!
//! A research paper and a blog post are different artefacts: one is dense,
//! sectioned, citation-laden prose; the other needs a hook, a readable
//! structure, and well-placed figures. This crate does the mechanical and
//! judgement-laden work in between — it validates that an upload really is
//! a paper, recovers its narrative structure and embedded figures, and
//! drives a VLM to rewrite it as a tagged, sectioned, illustrated post
//! while keeping figure references honest.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Validate  academic-format gate (keywords, sections, citations)
//!  ├─ 2. Layout    heading/paragraph recovery + page estimation
//!  ├─ 3. Images    embedded rasters → base64 PNG records (pdfium)
//!  ├─ 4. Authors   metadata parsing merged with AI extraction
//!  ├─ 5. Logos     vision call flags branding images for exclusion
//!  ├─ 6. Convert   multimodal prompt → JSON blog (parse + repair)
//!  └─ 7. Render    HTML body with {{IMAGE_i}} placeholders + thumbnail
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper2blog::{
//!     convert_to_blog, extract, ConversionConfig, GeminiBackend, GenerativeBackend,
//!     RateLimiter,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let backend: Arc<dyn GenerativeBackend> = Arc::new(GeminiBackend::new(
//!         std::env::var("GEMINI_API_KEY")?,
//!         "gemini-2.0-flash",
//!         config.api_timeout,
//!     )?);
//!     let limiter = RateLimiter::new(config.min_call_interval);
//!
//!     let bytes = std::fs::read("paper.pdf")?;
//!     let extraction = extract(&bytes, Some(&backend), &limiter, &config).await?;
//!     let blog = convert_to_blog(&extraction, &[], &backend, &limiter, &config).await?;
//!     println!("{}", blog.title);
//!     Ok(())
//! }
//! ```
//!
//! ## Collaborators
//!
//! Two external capabilities are modelled as traits and injected:
//!
//! * [`GenerativeBackend`] — a vision-capable model. Ships with
//!   [`GeminiBackend`] and [`OpenRouterBackend`]; backends that cannot
//!   score images simply skip logo detection (documented degenerate
//!   behaviour, not an error).
//! * [`storage::ObjectStorage`] — `upload(bytes) -> url`. The pipeline
//!   never touches buckets, credentials, or retries.
//!
//! Blog persistence, auth, and the web UI are out of scope entirely; the
//! output contract is [`BlogConversionResult`] with literal `{{IMAGE_i}}`
//! placeholders for the caller to substitute.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod ratelimit;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{GeminiBackend, GenerativeBackend, OpenRouterBackend, PromptPart};
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_to_blog, extract, process, select_best_thumbnail};
pub use error::{Paper2BlogError, RejectionReason};
pub use model::{
    AuthorDetectionResult, AuthorSource, BlogConversionResult, BlogSection, DetectedAuthor,
    DocumentInfo, ExtractedImage, ExtractionResult, LayoutSection, SectionKind,
};
pub use pipeline::authors::{format_authors, match_user, AuthorMatch, MatchRule, UserIdentity};
pub use ratelimit::RateLimiter;
pub use storage::{upload_images, ObjectStorage};
