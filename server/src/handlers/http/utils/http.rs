/// Returns true only when the request arrived over a secure (HTTPS) connection.
///
/// Checks, in order:
///   1. `X-Forwarded-Proto: https`   set by most reverse proxies (nginx, Caddy, etc.)
///   2. `X-Forwarded-Ssl: on`        Apache-style variant
///   3. The request URI scheme is literally "https"
///
/// Falls back to `false` so that plain HTTP dev servers work out of the box
/// without any configuration change.
pub fn is_https<B>(req: &hyper::Request<B>) -> bool {
    let header_is = |name: &str, expected: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    };

    if header_is("x-forwarded-proto", "https") || header_is("x-forwarded-ssl", "on") {
        return true;
    }

    req.uri()
        .scheme()
        .map(|s| s.as_str() == "https")
        .unwrap_or(false)
}

/// Whether to mark cookies `Secure`: the configured override, else the
/// transport the request came in on.
pub fn secure_cookies<B>(req: &hyper::Request<B>, forced: Option<bool>) -> bool {
    forced.unwrap_or_else(|| is_https(req))
}
