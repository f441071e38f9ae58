//! URL handling module for Payer-Scout
//!
//! This module provides URL normalization (the VisitedSet key), host
//! extraction, and the per-crawl allowed-domain filter.

mod domain;
mod normalize;

use crate::ConfigError;
use serde::Serialize;
use std::collections::BTreeSet;
use url::Url;

pub use domain::{extract_domain, strip_portal_prefix, PORTAL_SUBDOMAINS};
pub use normalize::{normalize_url, url_key};

/// Hostnames a crawl session may traverse
///
/// Built once at crawl start and never mutated afterwards. A host is allowed
/// when it equals an entry or is a subdomain of one, so `anthem.com` admits
/// `providers.anthem.com` but not `anthem.com.example` or `myanthem.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowedDomainSet {
    hosts: BTreeSet<String>,
}

impl AllowedDomainSet {
    /// Builds a set from explicit hostnames
    ///
    /// Entries are lowercased and a trailing dot is dropped. Entries that are
    /// empty or look like URLs rather than hostnames are rejected.
    pub fn new<I, S>(hosts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for host in hosts {
            set.insert(host.as_ref())?;
        }
        Ok(set)
    }

    /// Derives the set for an organization from its base domain
    ///
    /// Contains the base domain and its usual portal hosts
    /// (`www.`, `provider.`, `providers.`, `professional.`, `portal.`, `prov.`).
    pub fn for_base_domain(base_domain: &str) -> Result<Self, ConfigError> {
        let base = strip_portal_prefix(base_domain.trim().trim_end_matches('.'));
        let mut set = Self::default();
        set.insert(&base)?;
        for prefix in PORTAL_SUBDOMAINS {
            set.insert(&format!("{}.{}", prefix, base))?;
        }
        Ok(set)
    }

    /// Adds one more hostname (e.g. a known portal hosted elsewhere)
    pub fn insert(&mut self, host: &str) -> Result<(), ConfigError> {
        let host = host.trim().trim_end_matches('.').to_lowercase();
        if host.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "Allowed domain cannot be empty".to_string(),
            ));
        }
        if host
            .chars()
            .any(|c| c == '/' || c == ':' || c == '@' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidPattern(format!(
                "'{}' is not a hostname",
                host
            )));
        }
        self.hosts.insert(host);
        Ok(())
    }

    /// Returns true if `host` equals an entry or is a subdomain of one
    pub fn contains_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        self.hosts.iter().any(|allowed| {
            host == *allowed
                || (host.len() > allowed.len()
                    && host.ends_with(allowed.as_str())
                    && host.as_bytes()[host.len() - allowed.len() - 1] == b'.')
        })
    }

    /// Returns true if the URL's host is allowed
    pub fn allows(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.contains_host(host))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_host() {
        let set = AllowedDomainSet::new(["x.test"]).unwrap();
        assert!(set.contains_host("x.test"));
        assert!(set.contains_host("X.TEST"));
        assert!(!set.contains_host("y.test"));
    }

    #[test]
    fn test_subdomains_allowed() {
        let set = AllowedDomainSet::new(["anthem.com"]).unwrap();
        assert!(set.contains_host("providers.anthem.com"));
        assert!(set.contains_host("a.b.anthem.com"));
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        let set = AllowedDomainSet::new(["anthem.com"]).unwrap();
        assert!(!set.contains_host("myanthem.com"));
        assert!(!set.contains_host("anthem.com.evil.test"));
        assert!(!set.contains_host("com"));
    }

    #[test]
    fn test_for_base_domain() {
        let set = AllowedDomainSet::for_base_domain("uhc.com").unwrap();
        assert!(set.iter().any(|h| h == "uhc.com"));
        assert!(set.iter().any(|h| h == "provider.uhc.com"));
        assert!(set.iter().any(|h| h == "www.uhc.com"));
        assert_eq!(set.len(), 1 + PORTAL_SUBDOMAINS.len());
    }

    #[test]
    fn test_for_base_domain_strips_portal_prefix() {
        let set = AllowedDomainSet::for_base_domain("www.aetna.com").unwrap();
        assert!(set.iter().any(|h| h == "aetna.com"));
        assert!(!set.iter().any(|h| h == "www.www.aetna.com"));
    }

    #[test]
    fn test_allows_url() {
        let set = AllowedDomainSet::new(["x.test"]).unwrap();
        assert!(set.allows(&Url::parse("https://x.test/manual.pdf").unwrap()));
        assert!(set.allows(&Url::parse("http://docs.x.test:8080/").unwrap()));
        assert!(!set.allows(&Url::parse("https://other.test/").unwrap()));
    }

    #[test]
    fn test_invalid_entries() {
        assert!(AllowedDomainSet::new([""]).is_err());
        assert!(AllowedDomainSet::new(["https://x.test/"]).is_err());
        assert!(AllowedDomainSet::new(["x test"]).is_err());
    }

    #[test]
    fn test_empty_set_allows_nothing() {
        let set = AllowedDomainSet::new(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert!(!set.allows(&Url::parse("https://x.test/").unwrap()));
    }
}
