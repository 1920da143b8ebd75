//! Origin and port resolution helpers.
//!
//! An origin is `scheme://host:port` with the port always spelled out, so
//! `http://example.com` and `http://example.com:80` map to the same route.

use http::HeaderMap;
use url::Url;

/// Resolve the effective port of a URL.
///
/// Explicit ports win. Otherwise `ws`/`http` default to 80 and everything
/// else to 443.
pub fn resolve_port(url: &Url) -> u16 {
    match url.port() {
        Some(port) => port,
        None => match url.scheme() {
            "ws" | "http" => 80,
            _ => 443,
        },
    }
}

/// Build the routing origin for a URL.
pub fn get_origin(url: &Url) -> String {
    format!(
        "{}://{}:{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        resolve_port(url)
    )
}

/// Same URL with the resolved port written out explicitly.
pub fn with_default_port(url: &Url) -> String {
    let mut normalized = format!("{}{}", get_origin(url), url.path());
    if let Some(query) = url.query() {
        normalized.push('?');
        normalized.push_str(query);
    }
    normalized
}

/// Derive an origin from a pushed request when the channel did not supply one.
///
/// Prefers the request URI's scheme and authority; falls back to the `Host`
/// header over https.
pub fn origin_from_request(uri: &http::Uri, headers: &HeaderMap) -> Option<String> {
    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        let parsed = Url::parse(&format!("{}://{}", scheme, authority)).ok()?;
        return Some(get_origin(&parsed));
    }

    let host = headers.get(http::header::HOST)?.to_str().ok()?;
    let parsed = Url::parse(&format!("https://{}", host)).ok()?;
    Some(get_origin(&parsed))
}
