//! Output-language detection: Indonesian vs English.
//!
//! The blog platform's primary audience is Indonesian, so Indonesian is
//! the default and English must positively prove itself: its keyword count
//! has to beat the Indonesian count AND reach an absolute floor. Sampling
//! only the document head keeps the check cheap; the language of a paper
//! does not change after the first page.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Function words common in Indonesian academic prose.
const INDONESIAN_KEYWORDS: &[&str] = &[
    "dan", "yang", "untuk", "dengan", "dari", "pada", "dalam", "adalah", "ini", "itu",
    "penelitian", "hasil", "metode", "kesimpulan",
];

/// Function words common in English academic prose.
const ENGLISH_KEYWORDS: &[&str] = &[
    "the", "and", "of", "to", "in", "is", "that", "this", "with", "for", "research",
    "results", "method", "conclusion",
];

/// Absolute floor of English hits before English can win.
const ENGLISH_MIN_HITS: usize = 3;

/// The two output languages the conversion prompt can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Indonesian,
    English,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::Indonesian => "Indonesian",
            Language::English => "English",
        })
    }
}

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("word pattern"));

/// Detect the document language from its leading `sample_chars` characters.
///
/// English wins only when its keyword count strictly exceeds the
/// Indonesian count and reaches at least 3 hits; everything else defaults
/// to Indonesian.
pub fn detect_language(text: &str, sample_chars: usize) -> Language {
    let sample: String = text.chars().take(sample_chars).collect::<String>().to_lowercase();

    let mut id_count = 0usize;
    let mut en_count = 0usize;
    for word in WORD.find_iter(&sample) {
        let w = word.as_str();
        if INDONESIAN_KEYWORDS.contains(&w) {
            id_count += 1;
        }
        if ENGLISH_KEYWORDS.contains(&w) {
            en_count += 1;
        }
    }

    let language = if en_count > id_count && en_count >= ENGLISH_MIN_HITS {
        Language::English
    } else {
        Language::Indonesian
    };
    debug!("language detection: en={en_count} id={id_count} → {language}");
    language
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_text_detected() {
        let text = "The results of this research show that the method is sound and the \
                    conclusion follows for the data.";
        assert_eq!(detect_language(text, 1000), Language::English);
    }

    #[test]
    fn indonesian_text_detected() {
        let text = "Penelitian ini menggunakan metode survei dan hasil yang diperoleh \
                    menunjukkan bahwa kesimpulan dalam penelitian ini adalah valid untuk \
                    data yang digunakan pada studi ini.";
        assert_eq!(detect_language(text, 1000), Language::Indonesian);
    }

    #[test]
    fn ambiguous_text_defaults_to_indonesian() {
        assert_eq!(detect_language("1234 5678 !!!", 1000), Language::Indonesian);
        assert_eq!(detect_language("", 1000), Language::Indonesian);
    }

    #[test]
    fn sparse_english_below_floor_defaults_to_indonesian() {
        // Two English hits: beats zero Indonesian hits but under the floor.
        assert_eq!(detect_language("the cat, the hat", 1000), Language::Indonesian);
    }

    #[test]
    fn only_the_sample_window_is_considered() {
        // English material pushed past a tiny sample window is invisible.
        let text = format!("{}the results of the research in the method", "x".repeat(50));
        assert_eq!(detect_language(&text, 40), Language::Indonesian);
    }
}
