//! Relevance classification of links and pages
//!
//! [`score`] is pure and deterministic: the same inputs always yield the
//! same [`RelevanceResult`].

mod regions;
mod topics;

pub use regions::{
    is_state_tag, state_code, state_name, REGIONAL_UNSPECIFIED, STATES, STATE_COUNT,
};
pub use topics::{classify_topics, DocumentTopic};

use serde::Serialize;
use std::collections::BTreeSet;
use url::Url;

/// Keywords counted towards the topical score
pub const TOPICAL_KEYWORDS: [&str; 14] = [
    "provider",
    "manual",
    "guide",
    "policy",
    "procedure",
    "prior auth",
    "authorization",
    "timely filing",
    "appeals",
    "claims",
    "billing",
    "coverage",
    "benefits",
    "forms",
];

/// Classification of one link (or page)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelevanceResult {
    /// The URL points at a PDF
    pub is_document: bool,

    /// Keyword occurrences in the anchor text and URL
    pub topical_score: u32,

    /// State codes and/or `regional_unspecified`; empty means none
    pub regional_tags: BTreeSet<String>,
}

/// Scores a link by its URL, anchor text and optionally the page text
pub fn score(url: &Url, anchor_text: &str, page_text: Option<&str>) -> RelevanceResult {
    RelevanceResult {
        is_document: is_document(url),
        topical_score: topical_score(url, anchor_text),
        regional_tags: regional_tags(url, anchor_text, page_text),
    }
}

/// Returns true if the URL path or query mentions `.pdf`
pub fn is_document(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    let query = url.query().unwrap_or("").to_lowercase();
    path.contains(".pdf") || query.contains(".pdf")
}

/// Counts non-overlapping keyword occurrences in `anchor_text + " " + url`
pub fn topical_score(url: &Url, anchor_text: &str) -> u32 {
    let haystack = format!("{} {}", anchor_text, url.as_str()).to_lowercase();
    TOPICAL_KEYWORDS
        .iter()
        .map(|kw| haystack.matches(kw).count() as u32)
        .sum()
}

/// Collects the regional tags of a link or page
///
/// Full state names are read from all three inputs. Postal codes only come
/// from URL path segments and upper-case anchor tokens.
pub fn regional_tags(url: &Url, anchor_text: &str, page_text: Option<&str>) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    let mut combined = format!("{} {}", anchor_text, url.as_str());
    if let Some(text) = page_text {
        combined.push(' ');
        combined.push_str(text);
    }

    regions::full_name_tags(&combined, &mut tags);
    regions::path_code_tags(url.path(), &mut tags);
    regions::anchor_code_tags(anchor_text, &mut tags);
    regions::stem_tags(&combined, &mut tags);

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_ohio_manual() {
        let result = score(
            &url("https://x.test/docs/OH_CAID_ProviderManual.pdf"),
            "Ohio Medicaid Provider Manual",
            None,
        );
        assert!(result.is_document);
        assert!(result.regional_tags.contains("OH"));
        assert!(result.regional_tags.contains(REGIONAL_UNSPECIFIED));
        assert!(result.topical_score >= 2);
    }

    #[test]
    fn test_is_document() {
        assert!(is_document(&url("https://x.test/a/Manual.PDF")));
        assert!(is_document(&url("https://x.test/get?file=manual.pdf")));
        assert!(!is_document(&url("https://x.test/providers/")));
        assert!(!is_document(&url("https://x.test/pdfs/")));
    }

    #[test]
    fn test_topical_score_counts_occurrences() {
        let u = url("https://x.test/provider/forms");
        // "provider" twice, "forms" twice
        assert_eq!(topical_score(&u, "Provider Forms"), 4);
        assert_eq!(topical_score(&url("https://x.test/about"), "About us"), 0);
    }

    #[test]
    fn test_prior_auth_scores_both_keywords() {
        let u = url("https://x.test/x");
        assert_eq!(topical_score(&u, "Prior Authorization"), 2);
    }

    #[test]
    fn test_deterministic() {
        let u = url("https://x.test/tx/claims.pdf");
        let a = score(&u, "Texas Claims Guide", Some("Serving Texas and Oklahoma"));
        let b = score(&u, "Texas Claims Guide", Some("Serving Texas and Oklahoma"));
        assert_eq!(a, b);
        assert!(a.regional_tags.contains("TX"));
        assert!(a.regional_tags.contains("OK"));
    }

    #[test]
    fn test_codes_not_read_from_page_text() {
        let u = url("https://x.test/providers");
        let result = score(&u, "Providers", Some("Log in or sign up. OK?"));
        assert!(result.regional_tags.is_empty());
    }

    #[test]
    fn test_no_tags() {
        let result = score(&url("https://x.test/contact"), "Contact us", None);
        assert!(result.regional_tags.is_empty());
        assert!(!result.is_document);
        assert_eq!(result.topical_score, 0);
    }
}
