use url::Url;

/// Host prefixes that payer sites put in front of their registrable domain
pub const PORTAL_SUBDOMAINS: &[&str] = &["www", "provider", "providers", "professional", "portal", "prov"];

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use payer_scout::url::extract_domain;
///
/// let url = Url::parse("https://Providers.Anthem.com/docs/gpp/").unwrap();
/// assert_eq!(extract_domain(&url), Some("providers.anthem.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Strips one leading portal prefix (`www.`, `provider.`, ...) from a host
///
/// Used to recover a payer's base domain from a portal URL, e.g.
/// `providers.anthem.com` becomes `anthem.com`. Hosts with only two labels
/// are returned unchanged.
pub fn strip_portal_prefix(host: &str) -> String {
    let host = host.to_lowercase();
    if let Some((first, rest)) = host.split_once('.') {
        if rest.contains('.') && PORTAL_SUBDOMAINS.contains(&first) {
            return rest.to_string();
        }
    }
    host
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_ignores_port_and_path() {
        let url = Url::parse("http://127.0.0.1:8080/providers/manual.pdf?v=1").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://WWW.UHCProvider.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("www.uhcprovider.com".to_string()));
    }

    #[test]
    fn test_strip_portal_prefix() {
        assert_eq!(strip_portal_prefix("providers.anthem.com"), "anthem.com");
        assert_eq!(strip_portal_prefix("www.aetna.com"), "aetna.com");
        assert_eq!(strip_portal_prefix("Provider.Cigna.com"), "cigna.com");
    }

    #[test]
    fn test_strip_portal_prefix_leaves_other_hosts() {
        assert_eq!(strip_portal_prefix("anthem.com"), "anthem.com");
        assert_eq!(strip_portal_prefix("docs.anthem.com"), "docs.anthem.com");
        // "provider.com" is itself a registrable domain
        assert_eq!(strip_portal_prefix("provider.com"), "provider.com");
    }
}
