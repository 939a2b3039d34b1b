//! Small text helpers shared by adapters and the enrichment engine.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Slug used when a name has no alphanumeric characters at all.
const EMPTY_SLUG: &str = "unnamed";

/// Lower-case `name` and collapse every run of non-alphanumerics to `-`.
pub fn slugify(name: &str) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lower = name.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Word-initial capitalization: a letter following a non-letter is
/// upper-cased, every other letter is lower-cased.
///
/// `"text-generation"` becomes `"Text-Generation"`, `"GPT4all"` becomes `"Gpt4All"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }

    out
}

/// True when `s` parses as an absolute `http`/`https` URL with a host.
pub fn is_absolute_http_url(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Take at most `max_chars` characters of `s` (char-boundary safe).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Stable Diffusion XL"), "stable-diffusion-xl");
        assert_eq!(slugify("  org/Model_v2!! "), "org-model-v2");
        assert_eq!(slugify("???"), "unnamed");
    }

    #[test]
    fn title_case_matches_word_initials() {
        assert_eq!(title_case("text-generation"), "Text-Generation");
        assert_eq!(title_case("machine learning"), "Machine Learning");
        assert_eq!(title_case("LLM"), "Llm");
        assert_eq!(title_case("gpt4all"), "Gpt4All");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn absolute_url_check() {
        assert!(is_absolute_http_url("https://github.com/org/repo"));
        assert!(is_absolute_http_url("http://localhost:8080/x"));
        assert!(!is_absolute_http_url(""));
        assert!(!is_absolute_http_url("/posts/thing"));
        assert!(!is_absolute_http_url("ftp://example.com/file"));
        assert!(!is_absolute_http_url("not a url"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
