//! Cache key derivation.
//!
//! The key is the full request URL: scheme, host, path and query string.
//! Servers usually see requests in origin form (`/items?id=1`), so the
//! scheme and host are filled in from the request when the URI lacks them.

use http::header::HOST;
use http::Request;

const DEFAULT_SCHEME: &str = "http";

/// Derives the cache key for `req` from its full URL.
///
/// - Absolute-form URIs are used as-is.
/// - Otherwise the key is `<scheme>://<host><path>?<query>`, taking the host
///   from the URI authority or the `Host` header and defaulting the scheme
///   to `http`.
/// - Without any host the key falls back to the path and query.
pub fn cache_key<B>(req: &Request<B>) -> String {
    let uri = req.uri();
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    let host = uri.authority().map(|authority| authority.as_str()).or_else(|| {
        req.headers()
            .get(HOST)
            .and_then(|value| value.to_str().ok())
    });

    match host {
        Some(host) => {
            let scheme = uri.scheme_str().unwrap_or(DEFAULT_SCHEME);
            format!("{scheme}://{host}{path_and_query}")
        }
        None => path_and_query.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, host: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri(uri);
        if let Some(host) = host {
            builder = builder.header(HOST, host);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn absolute_uri_is_used_verbatim() {
        let req = request("https://api.example.com/items?id=1", None);
        assert_eq!(cache_key(&req), "https://api.example.com/items?id=1");
    }

    #[test]
    fn origin_form_uses_host_header() {
        let req = request("/items?id=1", Some("example.com:8080"));
        assert_eq!(cache_key(&req), "http://example.com:8080/items?id=1");
    }

    #[test]
    fn authority_wins_over_host_header() {
        let req = request("https://a.example/x", Some("b.example"));
        assert_eq!(cache_key(&req), "https://a.example/x");
    }

    #[test]
    fn falls_back_to_path_and_query_without_host() {
        let req = request("/items?id=1", None);
        assert_eq!(cache_key(&req), "/items?id=1");
    }

    #[test]
    fn identical_urls_share_a_key() {
        let a = request("/items?id=1", Some("example.com"));
        let b = request("/items?id=1", Some("example.com"));
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn query_string_is_part_of_the_key() {
        let a = request("/items?id=1", Some("example.com"));
        let b = request("/items?id=2", Some("example.com"));
        let c = request("/items", Some("example.com"));
        assert_ne!(cache_key(&a), cache_key(&b));
        assert_ne!(cache_key(&a), cache_key(&c));
    }

    #[test]
    fn hosts_are_distinguished() {
        let a = request("/items", Some("one.example"));
        let b = request("/items", Some("two.example"));
        assert_ne!(cache_key(&a), cache_key(&b));
    }
}
