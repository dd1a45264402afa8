use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hyper::Request;
use hyper::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

/// Extract cookie value by name
pub fn get_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim();
            if name == cookie_name {
                debug!("Cookie found: {}", cookie_name);
                Some(value.to_string())
            } else {
                None
            }
        })
        .or_else(|| {
            debug!("Cookie not found: {}", cookie_name);
            None
        })
}

/// `Expires` attribute format, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Set a cookie with options
///
/// `max_age` sets both `Max-Age` and a matching `Expires` for clients that
/// only honour the latter.
pub fn set_cookie(
    name: &str,
    value: &str,
    max_age: Option<Duration>,
    path: Option<&str>,
    http_only: bool,
    secure: bool,
) -> Result<HeaderValue> {
    let mut cookie = format!("{}={}", name, value);

    if let Some(age) = max_age {
        let secs = age.as_secs();
        let expires = if secs == 0 {
            DateTime::<Utc>::default()
        } else {
            i64::try_from(secs)
                .ok()
                .and_then(ChronoDuration::try_seconds)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        };
        cookie.push_str(&format!("; Max-Age={}", secs));
        cookie.push_str(&format!("; Expires={}", http_date(expires)));
    }

    if let Some(p) = path {
        cookie.push_str(&format!("; Path={}", p));
    }

    if http_only {
        cookie.push_str("; HttpOnly");
    }

    if secure {
        cookie.push_str("; Secure");
    }

    cookie.push_str("; SameSite=Strict");

    debug!("Setting cookie: {}", name);

    HeaderValue::from_str(&cookie).map_err(|e| {
        warn!("Failed to create cookie header for {}: {}", name, e);
        anyhow!("Invalid cookie value: {}", e)
    })
}

/// Session cookie carrying a token, living as long as the token does.
pub fn create_session_cookie(
    name: &str,
    token: &str,
    lifetime: Duration,
    secure: bool,
) -> Result<HeaderValue> {
    debug!("Creating session cookie: {} ({:?})", name, lifetime);
    set_cookie(name, token, Some(lifetime), Some("/"), true, secure)
}

/// Delete a cookie by overwriting it with an empty, already-expired value
pub fn delete_cookie(name: &str, secure: bool) -> Result<HeaderValue> {
    debug!("Deleting cookie: {}", name);
    set_cookie(
        name,
        "",
        Some(Duration::from_secs(0)),
        Some("/"),
        true,
        secure,
    )
}

/// Query parameter by name, decoded.
pub fn get_query_param<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.uri().query().and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    })
}

/// Add no-cache headers for non-static files
pub fn add_no_cache_headers<T>(mut res: hyper::Response<T>) -> hyper::Response<T> {
    let headers = res.headers_mut();

    headers.insert(
        "cache-control",
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("expires", HeaderValue::from_static("0"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    debug!("Added no-cache headers");
    res
}

/// Add custom cache headers with specified max-age
pub fn add_cache_headers_with_max_age<T>(
    mut res: hyper::Response<T>,
    max_age_seconds: Option<u64>,
) -> hyper::Response<T> {
    let headers = res.headers_mut();
    let time = max_age_seconds.unwrap_or(31536000);

    let cache_control = format!("public, max-age={}", time);
    headers.insert(
        "cache-control",
        HeaderValue::from_str(&cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600")),
    );
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    debug!("Added cache headers with max-age: {} seconds", time);
    res
}

/// Content-addressed files never change: one year, immutable.
pub fn add_immutable_cache_headers<T>(mut res: hyper::Response<T>) -> hyper::Response<T> {
    let headers = res.headers_mut();
    headers.insert(
        "cache-control",
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn get_cookie_finds_named_value() {
        let h = headers_with_cookie("a=1; admin_session=tok.en.sig; b=2");
        assert_eq!(get_cookie(&h, "admin_session").as_deref(), Some("tok.en.sig"));
        assert_eq!(get_cookie(&h, "missing"), None);
    }

    #[test]
    fn get_cookie_does_not_match_prefix() {
        let h = headers_with_cookie("admin_session_old=x");
        assert_eq!(get_cookie(&h, "admin_session"), None);
    }

    #[test]
    fn session_cookie_has_required_attributes() {
        let v = create_session_cookie("admin_session", "t", Duration::from_secs(86400), true)
            .unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("admin_session=t"));
        assert!(s.contains("Max-Age=86400"));
        assert!(s.contains("Expires="));
        assert!(s.contains("GMT"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Secure"));
        assert!(s.contains("SameSite=Strict"));
        assert!(s.contains("Path=/"));
    }

    #[test]
    fn insecure_cookie_omits_secure() {
        let v = create_session_cookie("s", "t", Duration::from_secs(60), false).unwrap();
        assert!(!v.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn delete_cookie_expires_in_the_past() {
        let v = delete_cookie("admin_session", false).unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("admin_session=;"));
        assert!(s.contains("Max-Age=0"));
        assert!(s.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn query_param_is_decoded() {
        let req = Request::builder()
            .uri("/api/clients?all=true&id=4%202")
            .body(())
            .unwrap();
        assert_eq!(get_query_param(&req, "all").as_deref(), Some("true"));
        assert_eq!(get_query_param(&req, "id").as_deref(), Some("4 2"));
        assert_eq!(get_query_param(&req, "nope"), None);
    }

    #[test]
    fn immutable_cache_header() {
        let res = add_immutable_cache_headers(hyper::Response::new(()));
        assert_eq!(
            res.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }
}
