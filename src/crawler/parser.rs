//! HTML parser for extracting links, title and visible text
//!
//! `scraper::Html` is not `Send`, so every parse here is synchronous and
//! returns owned data; callers never hold a document across an `.await`.

use scraper::{ElementRef, Html, Selector};
use url::Url;

const NON_NAVIGATIONAL_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// One hyperlink found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Whitespace-collapsed text of the anchor
    pub anchor_text: String,

    /// Absolute http(s) URL
    pub url: Url,
}

/// Links of a page in document order
///
/// Not deduplicated. [`ExtractedLinks::iter`] can be called any number of
/// times and always yields the same sequence.
#[derive(Debug, Clone, Default)]
pub struct ExtractedLinks {
    links: Vec<Link>,
}

impl ExtractedLinks {
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExtractedLinks {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Everything the crawl loop needs from one rendered page
#[derive(Debug, Clone)]
pub struct PageContent {
    pub final_url: Url,
    pub title: Option<String>,

    /// Visible body text, whitespace-collapsed
    pub text: String,
    pub links: ExtractedLinks,
}

/// Extracts every navigational `<a href>` from the HTML
///
/// # Example
///
/// ```
/// use payer_scout::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/docs/manual.pdf"> Provider
///     Manual </a>"#;
/// let base = Url::parse("https://x.test/providers/").unwrap();
/// let links = extract_links(html, &base);
/// let first = links.iter().next().unwrap();
/// assert_eq!(first.anchor_text, "Provider Manual");
/// assert_eq!(first.url.as_str(), "https://x.test/docs/manual.pdf");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> ExtractedLinks {
    let document = Html::parse_document(html);
    links_from_document(&document, base_url)
}

/// Parses a page once and returns its title, visible text and links
pub fn parse_page(html: &str, final_url: &Url) -> PageContent {
    let document = Html::parse_document(html);

    PageContent {
        final_url: final_url.clone(),
        title: extract_title(&document),
        text: extract_text(&document),
        links: links_from_document(&document, final_url),
    }
}

fn links_from_document(document: &Html, page_url: &Url) -> ExtractedLinks {
    let base_url = document_base(document, page_url);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, &base_url) {
                    links.push(Link {
                        anchor_text: anchor_text(&element),
                        url,
                    });
                }
            }
        }
    }

    ExtractedLinks { links }
}

/// Honors `<base href>` when present
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

fn anchor_text(element: &ElementRef<'_>) -> String {
    let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
    if !text.is_empty() {
        return text;
    }

    // Icon-only links
    ["aria-label", "title"]
        .iter()
        .find_map(|attr| element.value().attr(attr))
        .map(collapse_whitespace)
        .unwrap_or_default()
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|e| HIDDEN_ELEMENTS.contains(&e.name()))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty hrefs and fragment-only links
/// - javascript:, mailto:, tel: and data: schemes
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if NON_NAVIGATIONAL_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn urls(html: &str) -> Vec<String> {
        extract_links(html, &base_url())
            .iter()
            .map(|l| l.url.to_string())
            .collect()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test
            Page  </title></head><body></body></html>"#;
        let page = parse_page(html, &base_url());
        assert_eq!(page.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let page = parse_page("<html><head></head><body></body></html>", &base_url());
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let html = r#"<html><body><h1>Ohio</h1><script>var texas = 1;</script>
            <style>.x{}</style><p>Provider   forms</p></body></html>"#;
        let page = parse_page(html, &base_url());
        assert_eq!(page.text, "Ohio Provider forms");
    }

    #[test]
    fn test_relative_links() {
        let html = r#"<a href="/other">A</a><a href="other2">B</a><a href="https://other.com/p">C</a>"#;
        assert_eq!(
            urls(html),
            vec![
                "https://example.com/other",
                "https://example.com/other2",
                "https://other.com/p",
            ]
        );
    }

    #[test]
    fn test_document_order_and_no_dedup() {
        let html = r#"<a href="/b">B</a><a href="/a">A</a><a href="/b">B again</a>"#;
        let links = extract_links(html, &base_url());
        let texts: Vec<_> = links.iter().map(|l| l.anchor_text.as_str()).collect();
        assert_eq!(texts, vec!["B", "A", "B again"]);
    }

    #[test]
    fn test_iter_is_restartable() {
        let links = extract_links(r#"<a href="/a">A</a><a href="/b">B</a>"#, &base_url());
        let first: Vec<_> = links.iter().collect();
        let second: Vec<_> = links.iter().collect();
        assert_eq!(first, second);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_skips_non_navigational() {
        let html = r##"
            <a href="">Empty</a>
            <a>No href</a>
            <a href="#section">Jump</a>
            <a href="javascript:void(0)">JS</a>
            <a href="JavaScript:void(0)">JS</a>
            <a href="mailto:test@example.com">Mail</a>
            <a href="tel:+1234567890">Call</a>
            <a href="data:text/html,hi">Data</a>
            <a href="ftp://example.com/file">FTP</a>
            <a href="/valid">Valid</a>
        "##;
        assert_eq!(urls(html), vec!["https://example.com/valid"]);
    }

    #[test]
    fn test_download_links_kept() {
        let html = r#"<a href="/file.pdf" download>Download</a>"#;
        assert_eq!(urls(html), vec!["https://example.com/file.pdf"]);
    }

    #[test]
    fn test_anchor_text_collapsed() {
        let html = "<a href=\"/m\">\n  Provider <b>Manual</b>\n\t2024 </a>";
        let links = extract_links(html, &base_url());
        assert_eq!(links.iter().next().unwrap().anchor_text, "Provider Manual 2024");
    }

    #[test]
    fn test_anchor_text_falls_back_to_label() {
        let html = r#"<a href="/m" aria-label="Provider manual"><img src="i.png"></a>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(links.iter().next().unwrap().anchor_text, "Provider manual");
    }

    #[test]
    fn test_base_element() {
        let html = r#"<html><head><base href="https://cdn.example.com/docs/"></head>
            <body><a href="m.pdf">M</a></body></html>"#;
        assert_eq!(urls(html), vec!["https://cdn.example.com/docs/m.pdf"]);
    }

    #[test]
    fn test_parse_page_links() {
        let html = r#"<html><body><a href="/providers">Providers</a></body></html>"#;
        let page = parse_page(html, &base_url());
        assert_eq!(page.links.len(), 1);
        assert_eq!(page.final_url, base_url());
    }
}
