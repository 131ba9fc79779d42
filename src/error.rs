//! Error types for the paper2blog library.
//!
//! Two distinct failure tiers reflect two distinct failure modes:
//!
//! * [`Paper2BlogError`] — **Fatal**: the pipeline cannot produce a usable
//!   result (document rejected by the validator, unreadable PDF, the
//!   generative backend's response cannot be parsed even after repair).
//!   Returned as `Err(Paper2BlogError)` from the top-level entry points.
//!   A fatal error never carries a half-populated blog — a corrupted or
//!   incomplete conversion must not be silently published.
//!
//! * **Partial failures** — a single page or embedded image failed to
//!   process. These are logged with `tracing::warn!` and skipped; the
//!   extraction continues and simply returns fewer images. They never
//!   appear in the error enum.
//!
//! Logo detection and thumbnail selection sit between the two: a backend
//! failure there degrades to "no logos" / "first image" rather than
//! aborting, because they are enhancements, not core deliverables.

use std::fmt;
use thiserror::Error;

/// All fatal errors returned by the paper2blog library.
#[derive(Debug, Error)]
pub enum Paper2BlogError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The validator determined the document is not an academic paper.
    ///
    /// User-visible; carries the specific rejection reason so callers can
    /// explain to the uploader what was missing.
    #[error("document rejected: {reason}")]
    RejectedInput { reason: RejectionReason },

    /// The PDF could not be opened or its text could not be read at all.
    ///
    /// Per-page and per-image failures are NOT reported here — they are
    /// logged and skipped. This variant covers document-level failures only.
    #[error("extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    // ── Generative backend errors ─────────────────────────────────────────
    /// Network/HTTP-level failure calling the generative backend.
    ///
    /// Fatal for the main conversion call; the logo, thumbnail, and author
    /// steps catch this variant and fall back instead of propagating it.
    #[error("generative backend '{backend}' call failed: {detail}")]
    AiTransport { backend: String, detail: String },

    /// The backend's response could not be parsed as JSON even after the
    /// repair pass. Always fatal — never retried, never degraded.
    #[error("conversion failed: could not parse AI response: {detail}")]
    AiParse { detail: String },

    /// Author detection failed and no metadata fallback was available.
    #[error("author detection failed: {detail}")]
    AuthorDetectionFailed { detail: String },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The object-storage collaborator failed to upload an image.
    #[error("image upload failed: {detail}")]
    StorageFailed { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (panicked blocking task, runtime failure).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why the journal-format validator rejected a document.
///
/// Each check is distinguishable so tests can assert the exact reason and
/// logs can tell an uploader which academic signal was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Trimmed text shorter than the 500-character floor.
    TooShort,
    /// Fewer than 3 academic keywords found (abstract, doi, journal, ...).
    TooFewKeywords,
    /// Fewer than 2 structural sections found (abstract/introduction/...).
    TooFewSections,
    /// No citation pattern found (`[1]`, `(2024)`, `et al.`, DOI).
    NoCitations,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectionReason::TooShort => {
                "document text is too short to be an academic paper (< 500 characters)"
            }
            RejectionReason::TooFewKeywords => {
                "document lacks academic vocabulary (fewer than 3 academic keywords)"
            }
            RejectionReason::TooFewSections => {
                "document lacks standard paper sections (abstract, introduction, methods, ...)"
            }
            RejectionReason::NoCitations => {
                "document contains no citation patterns ([n], (year), et al., DOI)"
            }
        };
        f.write_str(msg)
    }
}
