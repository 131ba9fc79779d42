//! Configuration for the PDF-to-blog pipeline.
//!
//! All behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks and to diff two runs.
//!
//! Several fields are empirically tuned heuristic constants (the page
//! estimation divisor, the logo pixel threshold). They are configuration
//! rather than hard-coded invariants precisely because they were tuned, not
//! derived — a caller processing unusual documents can adjust them without
//! forking the crate.

use crate::error::Paper2BlogError;
use std::time::Duration;

/// Configuration for a PDF-to-blog conversion.
///
/// Built via [`ConversionConfig::builder()`] or
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use paper2blog::ConversionConfig;
/// use std::time::Duration;
///
/// let config = ConversionConfig::builder()
///     .min_call_interval(Duration::from_secs(4))
///     .logo_max_dimension(256)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Characters per estimated page in the layout parser. Default: 3000.
    ///
    /// Extracted text carries no reliable pagination, so the parser counts
    /// characters and divides. 3000 approximates a dense single-column
    /// journal page; the estimate only needs to be deterministic, not exact,
    /// because it feeds `--- Page N ---` prompt markers and image grouping,
    /// not anything user-visible.
    pub chars_per_page: usize,

    /// Pixel threshold for logo candidate validation. Default: 300.
    ///
    /// A logo candidate reported by the vision model is accepted only if it
    /// sits on page 1 or both dimensions are under this threshold. Real
    /// content figures (charts, micrographs) in papers are almost always
    /// larger than 300px on at least one axis.
    pub logo_max_dimension: u32,

    /// Minimum wall-clock interval between generative-backend calls.
    /// Default: 3 seconds.
    ///
    /// Free-tier vision APIs enforce per-minute quotas. The shared
    /// [`crate::ratelimit::RateLimiter`] spaces call-starts by this interval
    /// process-wide, across concurrent uploads.
    pub min_call_interval: Duration,

    /// Per-backend-call timeout. Default: 60 seconds.
    ///
    /// Expiry is fatal for the main conversion call and a silent fallback
    /// for logo detection and thumbnail selection.
    pub api_timeout: Duration,

    /// Bounded wait for embedded-image object resolution, per page.
    /// Default: 5 seconds.
    ///
    /// Some PDFs reference image objects that resolve slowly or not at all.
    /// On expiry the page's images are skipped, never the whole document.
    pub image_resolve_timeout: Duration,

    /// Maximum authors reported after merging. Default: 3.
    pub max_authors: usize,

    /// How many leading characters of the document feed AI author
    /// extraction. Default: 5000. Author blocks sit on page 1; sending the
    /// whole paper would only add noise and token cost.
    pub author_sample_chars: usize,

    /// How many leading characters feed language detection. Default: 1000.
    pub language_sample_chars: usize,

    /// Maximum images inlined into the conversion prompt. Default: 16.
    ///
    /// Vision APIs cap request sizes; papers with dozens of figures would
    /// blow the limit. Images beyond the cap are still listed textually in
    /// the prompt so the model can reference them.
    pub max_prompt_images: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            chars_per_page: 3000,
            logo_max_dimension: 300,
            min_call_interval: Duration::from_secs(3),
            api_timeout: Duration::from_secs(60),
            image_resolve_timeout: Duration::from_secs(5),
            max_authors: 3,
            author_sample_chars: 5000,
            language_sample_chars: 1000,
            max_prompt_images: 16,
            password: None,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn chars_per_page(mut self, n: usize) -> Self {
        self.config.chars_per_page = n.max(1);
        self
    }

    pub fn logo_max_dimension(mut self, px: u32) -> Self {
        self.config.logo_max_dimension = px;
        self
    }

    pub fn min_call_interval(mut self, interval: Duration) -> Self {
        self.config.min_call_interval = interval;
        self
    }

    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.config.api_timeout = timeout;
        self
    }

    pub fn image_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.config.image_resolve_timeout = timeout;
        self
    }

    pub fn max_authors(mut self, n: usize) -> Self {
        self.config.max_authors = n.max(1);
        self
    }

    pub fn author_sample_chars(mut self, n: usize) -> Self {
        self.config.author_sample_chars = n;
        self
    }

    pub fn language_sample_chars(mut self, n: usize) -> Self {
        self.config.language_sample_chars = n;
        self
    }

    pub fn max_prompt_images(mut self, n: usize) -> Self {
        self.config.max_prompt_images = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Paper2BlogError> {
        let c = &self.config;
        if c.chars_per_page == 0 {
            return Err(Paper2BlogError::InvalidConfig(
                "chars_per_page must be ≥ 1".into(),
            ));
        }
        if c.api_timeout.is_zero() {
            return Err(Paper2BlogError::InvalidConfig(
                "api_timeout must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.chars_per_page, 3000);
        assert_eq!(c.logo_max_dimension, 300);
        assert_eq!(c.min_call_interval, Duration::from_secs(3));
        assert_eq!(c.max_authors, 3);
    }

    #[test]
    fn builder_clamps_chars_per_page() {
        let c = ConversionConfig::builder().chars_per_page(0).build().unwrap();
        assert_eq!(c.chars_per_page, 1);
    }

    #[test]
    fn builder_sets_fields() {
        let c = ConversionConfig::builder()
            .logo_max_dimension(200)
            .min_call_interval(Duration::from_secs(2))
            .password("hunter2")
            .build()
            .unwrap();
        assert_eq!(c.logo_max_dimension, 200);
        assert_eq!(c.min_call_interval, Duration::from_secs(2));
        assert_eq!(c.password.as_deref(), Some("hunter2"));
    }
}
