use crate::UrlError;
use url::Url;

/// Click and analytics ids; together with `utm_*` the only keys dropped.
/// Generic names like `ref` or `source` often select the document itself.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "msclkid", "mc_eid", "mc_cid", "_ga", "_gl"];

/// Canonical form of a URL, used as the visited-set and document key
///
/// Two links that fetch the same page must normalize to the same URL:
/// - only http and https are accepted, and the host must be present
/// - the host is lowercased, the path keeps its case
/// - empty and dot segments collapse, a trailing slash is dropped (the root stays `/`)
/// - the fragment is dropped
/// - tracking parameters (`utm_*` and the usual click ids) are dropped, the
///   rest are sorted by key and an empty query disappears
///
/// Scheme and a leading `www.` are kept, since payer sites often serve
/// different content on `www.` and the bare domain.
///
/// ```
/// use payer_scout::url::normalize_url;
///
/// let url = normalize_url("https://X.TEST/providers/?utm_source=mail#top").unwrap();
/// assert_eq!(url.as_str(), "https://x.test/providers");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// The canonical string of an already parsed URL
pub fn url_key(url: &Url) -> Result<String, UrlError> {
    canonicalize(url.clone()).map(String::from)
}

fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    if url.host_str() != Some(host.as_str()) {
        url.set_host(Some(&host))
            .map_err(|e| UrlError::Malformed(e.to_string()))?;
    }

    let path = collapse_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort_by(|a, b| a.0.cmp(&b.0));

    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }

    Ok(url)
}

fn collapse_path(path: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                kept.pop();
            }
            _ => kept.push(segment),
        }
    }
    format!("/{}", kept.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
