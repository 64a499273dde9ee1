//! Header rewriting for forwarded requests and relayed responses.
//!
//! [`build_forwarded_headers`] clones the client's headers, strips
//! hop-by-hop headers and the inbound correlation header, rewrites
//! `Host` for the upstream, and adds `Via` / `X-Forwarded-Host`.

use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Headers for the upstream request.
///
/// `correlation_header` is removed so the outbound layer can attach the id
/// bound for this request, which differs from the inbound value when the
/// request header is ignored.
#[must_use]
pub fn build_forwarded_headers(
    original: &HeaderMap,
    target: &Url,
    correlation_header: &HeaderName,
) -> HeaderMap {
    let mut headers = original.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(correlation_header);

    if let Some(original_host) = original.get("host") {
        headers.insert("x-forwarded-host", original_host.clone());
    }

    if let Some(host) = target.host_str() {
        let host_value = target
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert("host", val);
        }
    }

    headers.append("via", HeaderValue::from_static("1.1 correlid"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlation() -> HeaderName {
        HeaderName::from_static("x-correlation-id")
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let target = Url::parse("http://target:8080").unwrap();
        let result = build_forwarded_headers(&original, &target, &correlation());

        assert!(result.get("connection").is_none());
        assert!(result.get("content-type").is_some());
    }

    #[test]
    fn rewrites_host_and_keeps_the_original() {
        let mut original = HeaderMap::new();
        original.insert("host", "public.example".parse().unwrap());

        let target = Url::parse("http://backend:9090/path").unwrap();
        let result = build_forwarded_headers(&original, &target, &correlation());

        assert_eq!(result.get("host").unwrap(), "backend:9090");
        assert_eq!(result.get("x-forwarded-host").unwrap(), "public.example");
    }

    #[test]
    fn drops_the_inbound_correlation_header() {
        let mut original = HeaderMap::new();
        original.insert("x-correlation-id", "ABC123".parse().unwrap());

        let target = Url::parse("http://backend:9090").unwrap();
        let result = build_forwarded_headers(&original, &target, &correlation());

        assert!(result.get("x-correlation-id").is_none());
    }

    #[test]
    fn appends_via() {
        let mut original = HeaderMap::new();
        original.insert("via", "1.1 edge".parse().unwrap());

        let target = Url::parse("http://backend").unwrap();
        let result = build_forwarded_headers(&original, &target, &correlation());

        let via: Vec<_> = result.get_all("via").iter().collect();
        assert_eq!(via, ["1.1 edge", "1.1 correlid"]);
    }
}
