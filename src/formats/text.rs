//! Text cleanup shared by the extractors.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(19|20)\d{2}").expect("valid regex"));
static TAG_INVALID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("valid regex"));
static PEOPLE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:,|;|&|\sand\s)\s*").expect("valid regex"));

/// Replace every HTML/XML tag with a space.
pub fn strip_html(input: &str) -> String {
    TAG_RE.replace_all(input, " ").into_owned()
}

/// Decode the handful of entities that survive in book descriptions.
///
/// `&amp;` is decoded last so `&amp;lt;` becomes `&lt;`, not `<`.
pub fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RE.replace_all(input, " ").trim().to_string()
}

/// Turn an HTML description into plain text. Empty results become `None`.
pub fn clean_description(input: &str) -> Option<String> {
    let cleaned = collapse_whitespace(&decode_entities(&strip_html(input)));
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Find the first plausible four-digit year (1900-2099) in free text.
pub fn extract_year(input: &str) -> Option<i32> {
    YEAR_RE.find(input).and_then(|m| m.as_str().parse().ok())
}

/// Normalise a subject into a tag: lower-case, hyphen-separated, `[a-z0-9_-]` only.
pub fn sanitize_tag(input: &str) -> Option<String> {
    let lowered = input.trim().to_lowercase();
    let hyphenated = WHITESPACE_RE.replace_all(&lowered, "-");
    let tag = TAG_INVALID_RE.replace_all(&hyphenated, "").into_owned();
    (!tag.is_empty()).then_some(tag)
}

/// Count whitespace-delimited tokens.
pub fn count_words(input: &str) -> u64 {
    input.split_whitespace().count() as u64
}

/// Split a free-text people list ("A, B & C and D") into names.
pub fn split_people(input: &str) -> Vec<String> {
    PEOPLE_SPLIT_RE
        .split(input)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_is_flattened() {
        let raw = "<p>A  <b>bold</b>&nbsp;tale &amp; more &lt;3 &quot;quoted&quot; it&#39;s it&#x27;s</p>\n\n<p>Next</p>";
        assert_eq!(
            clean_description(raw).as_deref(),
            Some("A bold tale & more <3 \"quoted\" it's it's Next")
        );
        assert_eq!(clean_description("<p>  </p>"), None);
    }

    #[test]
    fn ampersand_decoded_last() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn year_from_various_dates() {
        assert_eq!(extract_year("2011-05-03T00:00:00Z"), Some(2011));
        assert_eq!(extract_year("D:19991231235959+01'00'"), Some(1999));
        assert_eq!(extract_year("First published in 1965 by Chilton"), Some(1965));
        assert_eq!(extract_year("1850"), None);
        assert_eq!(extract_year("unknown"), None);
    }

    #[test]
    fn tags_are_sanitized() {
        assert_eq!(sanitize_tag("Science Fiction").as_deref(), Some("science-fiction"));
        assert_eq!(sanitize_tag("  Fantasy /  Epic ").as_deref(), Some("fantasy--epic"));
        assert_eq!(sanitize_tag("snake_case-ok").as_deref(), Some("snake_case-ok"));
        assert_eq!(sanitize_tag("!!!"), None);
    }

    #[test]
    fn words_count_after_stripping() {
        assert_eq!(count_words(&strip_html("<p>one<br/>two</p>\n<p>three</p>")), 3);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn people_lists_split() {
        assert_eq!(
            split_people("Alice Smith; Bob Jones & Carol and Dan, Erin"),
            vec!["Alice Smith", "Bob Jones", "Carol", "Dan", "Erin"]
        );
        assert_eq!(split_people("Alexander Anderson"), vec!["Alexander Anderson"]);
    }
}
