//! Field normalization shared by the importer and the validator.
//!
//! Everything here is pure: the same input always yields the same slug,
//! canonical URL or sanitized text, which is what makes re-imports idempotent
//! and filename checks reproducible.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use sha2::{Digest, Sha256};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::constants::{FALLBACK_SLUG, URL_HASH_SUFFIX_LEN};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NAME_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-\.'&]").unwrap());
static DESCRIPTION_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s\-\.,;:!?()'"/&]"#).unwrap());

/// NFKC-normalize, flatten escaped and literal line breaks, drop control
/// characters and collapse whitespace.
pub fn sanitize_text(value: &str) -> String {
    let composed: String = value.nfkc().collect();
    let flattened = composed
        .replace("\\t", " ")
        .replace("\\n", " ")
        .replace("\\r", " ")
        .replace(['\t', '\n', '\r'], " ");

    let visible: String = flattened.chars().filter(|c| !c.is_control()).collect();

    WHITESPACE.replace_all(&visible, " ").trim().to_string()
}

/// Sanitize a display name: word characters, whitespace and `- . ' &` only.
pub fn sanitize_name(value: &str) -> String {
    let text = sanitize_text(value);
    let kept = NAME_DISALLOWED.replace_all(&text, "");
    WHITESPACE.replace_all(&kept, " ").trim().to_string()
}

/// Sanitize free text while keeping readable punctuation.
pub fn sanitize_description(value: &str) -> String {
    let text = sanitize_text(value);
    let kept = DESCRIPTION_DISALLOWED.replace_all(&text, "");
    WHITESPACE.replace_all(&kept, " ").trim().to_string()
}

/// Deterministic, filesystem-safe identifier for a display name.
///
/// Accents are folded first (`é` -> `e`). Then lower-case ASCII alphanumerics
/// are kept; every other run of characters becomes a single hyphen, and
/// leading/trailing hyphens are trimmed.
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_hyphen = false;
    for c in name.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a repository URL for duplicate detection.
///
/// Requires an absolute `http`/`https` URL with a host. Scheme and host are
/// lower-cased, default ports, credentials and fragments dropped, and trailing
/// slashes removed from the path. The query string is kept.
pub fn canonical_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    let host = url.host_str()?.to_lowercase();

    let mut canonical = format!("{}://{}", url.scheme(), host);
    // `port()` is already None when the port is the scheme default
    if let Some(port) = url.port() {
        canonical.push_str(&format!(":{}", port));
    }
    canonical.push_str(url.path().trim_end_matches('/'));
    if let Some(query) = url.query() {
        canonical.push('?');
        canonical.push_str(query);
    }
    Some(canonical)
}

/// Host portion of a canonical URL, without a leading `www.`
pub fn url_host(canonical: &str) -> Option<String> {
    let url = Url::parse(canonical).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_lowercase())
}

/// Short suffix identifying where a project is hosted, e.g. `github-com`
pub fn host_suffix(canonical: &str) -> String {
    match url_host(canonical) {
        Some(host) => slugify(&host),
        None => FALLBACK_SLUG.to_string(),
    }
}

/// First hex characters of the SHA-256 of a canonical URL
pub fn url_hash_suffix(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..URL_HASH_SUFFIX_LEN].to_string()
}

/// File stems a record may live under, in order of preference.
pub fn candidate_stems(name: &str, canonical: &str) -> [String; 3] {
    let slug = slugify(name);
    let with_host = format!("{}-{}", slug, host_suffix(canonical));
    let with_hash = format!("{}-{}", with_host, url_hash_suffix(canonical));
    [slug, with_host, with_hash]
}

/// Hosting platform inferred from a repository host
pub fn platform_for_host(host: &str) -> String {
    match host {
        "github.com" => "github".to_string(),
        "gitlab.com" => "gitlab".to_string(),
        "codeberg.org" => "codeberg".to_string(),
        "bitbucket.org" => "bitbucket".to_string(),
        "sr.ht" | "git.sr.ht" => "sourcehut".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_runs_of_non_alphanumerics() {
        assert_eq!(slugify("My  Cool -- Project!"), "my-cool-project");
        assert_eq!(slugify("  __rust__  "), "rust");
        assert_eq!(slugify("!!!"), "project");
    }

    #[test]
    fn slug_folds_accents() {
        assert_eq!(slugify("Zürich Café"), "zurich-cafe");
        assert_eq!(slugify("Łódź Ñandú"), "odz-nandu");
        assert_eq!(slugify("Crème Brûlée.js"), "creme-brulee-js");
        // Precomposed and decomposed spellings share a slug
        assert_eq!(slugify("Cafe\u{301}"), slugify("Caf\u{e9}"));
    }

    #[test]
    fn canonical_url_normalizes_host_port_and_trailing_slash() {
        assert_eq!(
            canonical_url("HTTPS://GitHub.COM:443/Acme/Widget/").as_deref(),
            Some("https://github.com/Acme/Widget")
        );
        assert_eq!(
            canonical_url("http://example.org:80/").as_deref(),
            Some("http://example.org")
        );
        assert_eq!(
            canonical_url("https://example.org:8443/x#readme").as_deref(),
            Some("https://example.org:8443/x")
        );
    }

    #[test]
    fn canonical_url_rejects_relative_and_non_http() {
        assert_eq!(canonical_url(""), None);
        assert_eq!(canonical_url("github.com/acme/widget"), None);
        assert_eq!(canonical_url("ftp://example.org/pub"), None);
        assert_eq!(canonical_url("mailto:someone@example.org"), None);
    }

    #[test]
    fn sanitize_text_flattens_escapes_and_controls() {
        assert_eq!(sanitize_text("  a\\nb\tc\u{0007}d  "), "a b cd");
        assert_eq!(sanitize_text("one\r\n\r\ntwo"), "one two");
    }

    #[test]
    fn sanitize_text_applies_compatibility_composition() {
        assert_eq!(sanitize_text("ﬁle\u{00a0}sync"), "file sync");
        assert_eq!(sanitize_text("Cafe\u{301}"), "Caf\u{e9}");
        assert_eq!(sanitize_text("Ｗｉｄｇｅｔ"), "Widget");
    }

    #[test]
    fn sanitize_name_strips_symbols() {
        assert_eq!(sanitize_name("Rock & Roll© <Tools>"), "Rock & Roll Tools");
        assert_eq!(sanitize_name("Zürich Café"), "Zürich Café");
        assert_eq!(sanitize_name("O'Reilly.rs"), "O'Reilly.rs");
    }

    #[test]
    fn sanitize_description_keeps_punctuation() {
        assert_eq!(
            sanitize_description("Fast, safe (and fun)! <b>bold</b>"),
            "Fast, safe (and fun)! bbold/b"
        );
    }

    #[test]
    fn candidate_stems_follow_the_disambiguation_ladder() {
        let [slug, with_host, with_hash] =
            candidate_stems("Widget", "https://www.gitlab.com/acme/widget");
        assert_eq!(slug, "widget");
        assert_eq!(with_host, "widget-gitlab-com");
        assert!(with_hash.starts_with("widget-gitlab-com-"));
        assert_eq!(with_hash.len(), "widget-gitlab-com-".len() + URL_HASH_SUFFIX_LEN);
    }

    #[test]
    fn platform_is_derived_from_known_hosts() {
        assert_eq!(platform_for_host("github.com"), "github");
        assert_eq!(platform_for_host("git.example.org"), "git.example.org");
    }
}
