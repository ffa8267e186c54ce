//! Folder naming convention: `Author & Author - [Series N] Title`.

use crate::library::UNKNOWN_AUTHOR;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

const AUTHOR_TITLE_SEPARATOR: &str = " - ";

static AUTHOR_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:&|,|\band\b)\s*").expect("valid regex"));

static SERIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+)\s+(\d+(?:\.\d)?)\] ?(.+)$").expect("valid regex"));

/// Structured guess derived from a folder's base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFolder {
    /// Book title.
    pub title: String,
    /// Authors, never empty.
    pub authors: Vec<String>,
    /// Series name.
    pub series: Option<String>,
    /// Position in series, only set together with `series`.
    pub series_number: Option<String>,
}

/// Parse a folder base name.
///
/// Only the first `" - "` separates authors from the title. A bracketed
/// prefix is a series only when it ends in a number (`[Mistborn 1]`,
/// `[Discworld 2.5]`); otherwise it stays part of the title.
pub fn parse_folder_name(folder_name: &str) -> ParsedFolder {
    let Some((left, right)) = folder_name.split_once(AUTHOR_TITLE_SEPARATOR) else {
        return ParsedFolder {
            title: folder_name.trim().to_string(),
            authors: vec![UNKNOWN_AUTHOR.to_string()],
            series: None,
            series_number: None,
        };
    };

    let mut authors = split_authors(left);
    if authors.is_empty() {
        authors.push(UNKNOWN_AUTHOR.to_string());
    }

    let right = right.trim();
    let (title, series, series_number) = match SERIES_RE.captures(right) {
        Some(caps) if !caps[3].trim().is_empty() => (
            caps[3].trim().to_string(),
            Some(caps[1].trim().to_string()),
            Some(caps[2].to_string()),
        ),
        _ => (right.to_string(), None, None),
    };

    let title = if title.is_empty() {
        folder_name.trim().to_string()
    } else {
        title
    };

    ParsedFolder {
        title,
        authors,
        series,
        series_number,
    }
}

fn split_authors(raw: &str) -> Vec<String> {
    AUTHOR_SPLIT_RE
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_author_series_and_title() {
        let parsed = parse_folder_name("Brandon Sanderson - [Mistborn 1] The Final Empire");
        assert_eq!(parsed.title, "The Final Empire");
        assert_eq!(parsed.authors, vec!["Brandon Sanderson"]);
        assert_eq!(parsed.series.as_deref(), Some("Mistborn"));
        assert_eq!(parsed.series_number.as_deref(), Some("1"));
    }

    #[test]
    fn decimal_series_number_and_multiword_series() {
        let parsed = parse_folder_name("Robert Jordan - [The Wheel of Time 0.5]New Spring");
        assert_eq!(parsed.series.as_deref(), Some("The Wheel of Time"));
        assert_eq!(parsed.series_number.as_deref(), Some("0.5"));
        assert_eq!(parsed.title, "New Spring");
    }

    #[test]
    fn no_separator_means_unknown_author() {
        let parsed = parse_folder_name("Some Untitled Collection");
        assert_eq!(parsed.title, "Some Untitled Collection");
        assert_eq!(parsed.authors, vec![UNKNOWN_AUTHOR]);
        assert_eq!(parsed.series, None);
        assert_eq!(parsed.series_number, None);
    }

    #[test]
    fn multiple_authors_keep_order() {
        let amp = parse_folder_name("Terry Pratchett & Neil Gaiman - Good Omens");
        assert_eq!(amp.authors, vec!["Terry Pratchett", "Neil Gaiman"]);
        assert_eq!(amp.title, "Good Omens");

        let comma = parse_folder_name("Neil Gaiman, Terry Pratchett - Good Omens");
        assert_eq!(comma.authors, vec!["Neil Gaiman", "Terry Pratchett"]);

        let word = parse_folder_name("Douglas Preston AND Lincoln Child - Relic");
        assert_eq!(word.authors, vec!["Douglas Preston", "Lincoln Child"]);
    }

    #[test]
    fn and_inside_a_name_is_not_a_separator() {
        let parsed = parse_folder_name("Sandra Anderson - Title");
        assert_eq!(parsed.authors, vec!["Sandra Anderson"]);
    }

    #[test]
    fn only_first_separator_splits() {
        let parsed = parse_folder_name("Isaac Asimov - Foundation - Special Edition");
        assert_eq!(parsed.authors, vec!["Isaac Asimov"]);
        assert_eq!(parsed.title, "Foundation - Special Edition");
    }

    #[test]
    fn unnumbered_bracket_stays_in_title() {
        let parsed = parse_folder_name("Author - [Unnumbered] Title");
        assert_eq!(parsed.title, "[Unnumbered] Title");
        assert_eq!(parsed.series, None);
        assert_eq!(parsed.series_number, None);
    }

    #[test]
    fn series_without_title_is_not_a_series() {
        let parsed = parse_folder_name("Author - [Saga 3]");
        assert_eq!(parsed.title, "[Saga 3]");
        assert_eq!(parsed.series, None);
    }

    #[test]
    fn empty_author_side_falls_back() {
        let parsed = parse_folder_name(" - Orphan Title");
        assert_eq!(parsed.authors, vec![UNKNOWN_AUTHOR]);
        assert_eq!(parsed.title, "Orphan Title");
    }
}
