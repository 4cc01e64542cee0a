//! Language codes and display names.

/// Languages offered as translation targets by the CLI.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 4] = [
    ("en", "English"),
    ("hi", "Hindi"),
    ("mr", "Marathi"),
    // Limited support on most services.
    ("sa", "Sanskrit"),
];

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("mr", "Marathi"),
    ("sa", "Sanskrit"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
    ("bn", "Bengali"),
    ("gu", "Gujarati"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("ne", "Nepali"),
    ("ur", "Urdu"),
    ("auto", "Auto Detect"),
    ("unknown", "Unknown"),
];

/// English display name for a code, or `Language (<code>)`.
pub fn language_name(code: &str) -> String {
    let code = code.trim().to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Language ({code})"))
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}
