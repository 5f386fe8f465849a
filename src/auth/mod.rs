pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod password;

use axum::http::HeaderMap;

/// Extract the client IP address from request headers.
///
/// Checks `X-Forwarded-For` first (for reverse proxies), then falls back to `X-Real-IP`.
#[must_use]
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("10.0.0.9"));
        assert_eq!(extract_client_ip(&HeaderMap::new()), None);
    }
}
