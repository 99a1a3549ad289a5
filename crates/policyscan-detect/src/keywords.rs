/// Phrases whose presence in an element's text marks the page as
/// privacy-policy relevant. All lowercase.
pub const PRIVACY_KEYWORDS: &[&str] = &[
    "privacy policy",
    "data policy",
    "data protection policy",
    "privacy statement",
    "policy agreement",
    "privacy agreement",
    "data privacy",
    "data protection",
    "personal information",
];

/// Returns the first keyword contained in `text`, compared case-insensitively.
///
/// Containment, not equality: "Read our Privacy Policy here" matches.
#[must_use]
pub fn matching_keyword(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    PRIVACY_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lower.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_phrase_matches() {
        assert_eq!(matching_keyword("privacy policy"), Some("privacy policy"));
    }

    #[test]
    fn phrase_inside_longer_text_matches() {
        assert_eq!(
            matching_keyword("Please read our Privacy Policy before continuing."),
            Some("privacy policy")
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            matching_keyword("YOUR PERSONAL INFORMATION"),
            Some("personal information")
        );
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert_eq!(matching_keyword("Terms of Service"), None);
        assert_eq!(matching_keyword("privacy"), None);
        assert_eq!(matching_keyword(""), None);
    }

    #[test]
    fn every_keyword_is_lowercase() {
        for keyword in PRIVACY_KEYWORDS {
            assert_eq!(*keyword, keyword.to_lowercase());
        }
    }
}
