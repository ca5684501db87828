//! Languages offered for translation.

pub const LANGUAGES: [(&str, &str); 9] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// Display name for a language code; unknown codes are shown as-is.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

pub fn language_codes() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|(code, _)| *code)
}

pub fn is_supported(code: &str) -> bool {
    language_codes().any(|c| c == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("es"), "Spanish");
        assert_eq!(language_name("ko"), "Korean");
        assert_eq!(language_name("xx"), "xx");
    }

    #[test]
    fn test_language_codes() {
        let codes: Vec<_> = language_codes().collect();
        assert_eq!(codes.len(), 9);
        assert_eq!(codes[0], "en");
        assert!(is_supported("ja"));
        assert!(!is_supported("EN"));
    }
}
