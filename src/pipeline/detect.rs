//! Language detection.
//!
//! Text is cleaned first (URLs and e-mail addresses carry no language signal)
//! and rejected when too little remains. The statistical work sits behind
//! [`LanguageIdentifier`] so tests can swap in a deterministic fake; the
//! default implementation is `whatlang`.

use crate::error::DetectionError;
use crate::output::Detection;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Confidence reported when the identifier cannot score its own guess.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A language and its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageScore {
    pub language: String,
    pub probability: f64,
}

/// Statistical language identification.
pub trait LanguageIdentifier: Send + Sync {
    /// The single most likely language code.
    fn identify(&self, text: &str) -> Result<String, DetectionError>;

    /// Candidate languages with probabilities, most likely first.
    fn ranked(&self, text: &str) -> Result<Vec<LanguageScore>, DetectionError>;
}

/// [`LanguageIdentifier`] backed by `whatlang`, reporting ISO 639-1 codes.
///
/// whatlang only scores its best guess, so `ranked` has at most one entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangIdentifier;

impl LanguageIdentifier for WhatlangIdentifier {
    fn identify(&self, text: &str) -> Result<String, DetectionError> {
        whatlang::detect(text)
            .map(|info| iso639_1(info.lang().code()))
            .ok_or_else(|| DetectionError::Detector("No features in text".into()))
    }

    fn ranked(&self, text: &str) -> Result<Vec<LanguageScore>, DetectionError> {
        Ok(whatlang::detect(text)
            .map(|info| LanguageScore {
                language: iso639_1(info.lang().code()),
                probability: info.confidence(),
            })
            .into_iter()
            .collect())
    }
}

/// Map whatlang's ISO 639-3 codes onto the two-letter codes the translation
/// services use. Codes without a two-letter form pass through.
fn iso639_1(code: &str) -> String {
    let mapped = match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "no",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    };
    mapped.to_string()
}

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove URLs and e-mail addresses and collapse whitespace runs.
pub fn clean_for_detection(text: &str) -> String {
    let s = URL.replace_all(text, "");
    let s = EMAIL.replace_all(&s, "");
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

/// Language detector with a minimum-length guard.
#[derive(Clone)]
pub struct LanguageDetector {
    identifier: Arc<dyn LanguageIdentifier>,
    min_chars: usize,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(10)
    }
}

impl LanguageDetector {
    /// whatlang-backed detector.
    pub fn new(min_chars: usize) -> Self {
        Self::with_identifier(Arc::new(WhatlangIdentifier), min_chars)
    }

    pub fn with_identifier(identifier: Arc<dyn LanguageIdentifier>, min_chars: usize) -> Self {
        Self {
            identifier,
            min_chars,
        }
    }

    pub fn detect(&self, text: &str) -> Result<Detection, DetectionError> {
        let cleaned = clean_for_detection(text);
        let chars = cleaned.chars().count();
        if chars < self.min_chars {
            return Err(DetectionError::TooShort { chars });
        }

        let language = self.identifier.identify(&cleaned)?;
        let confidence = match self.identifier.ranked(&cleaned) {
            Ok(scores) => scores
                .iter()
                .find(|s| s.language == language)
                .map(|s| s.probability)
                .unwrap_or(DEFAULT_CONFIDENCE),
            Err(e) => {
                debug!("Ranking failed, using default confidence: {}", e);
                DEFAULT_CONFIDENCE
            }
        };

        let confidence = ((confidence.clamp(0.0, 1.0)) * 100.0).round() / 100.0;
        debug!("Detected language {} ({:.2})", language, confidence);
        Ok(Detection {
            language,
            confidence,
        })
    }
}

impl std::fmt::Debug for LanguageDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageDetector")
            .field("min_chars", &self.min_chars)
            .finish_non_exhaustive()
    }
}
