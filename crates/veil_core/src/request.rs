use std::collections::HashMap;

use hyper::header::{HeaderName, HeaderValue, USER_AGENT};
use hyper::{Body, Method, Request};
use veil_net::{FingerprintProfile, VeilError};

/// Caller-supplied description of a single request. Immutable once built;
/// the caller owns it until it is handed to [`assemble`].
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub url: String,
    pub method: String,
    /// Fingerprint profile name, resolved through `veil_net::resolve`.
    pub profile: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Build the HTTP request for one invocation.
///
/// The method is normalized to upper case and the URL used as-is. The
/// profile's User-Agent goes in first; caller headers are applied afterwards
/// and each insert overwrites any same-named header, case-insensitively.
/// Last write wins per key — duplicate caller headers collapse rather than
/// accumulate.
pub fn assemble(
    params: &RequestParams,
    profile: &FingerprintProfile,
) -> Result<Request<Body>, VeilError> {
    let method = Method::from_bytes(params.method.to_ascii_uppercase().as_bytes())
        .map_err(|e| VeilError::request_build(format!("invalid method {:?}: {e}", params.method)))?;

    let body = match &params.body {
        Some(data) if !data.is_empty() => Body::from(data.clone()),
        _ => Body::empty(),
    };

    let mut request = Request::builder()
        .method(method)
        .uri(params.url.as_str())
        .body(body)
        .map_err(VeilError::request_build)?;

    let headers = request.headers_mut();
    headers.insert(USER_AGENT, HeaderValue::from_static(profile.user_agent));

    for (name, value) in &params.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| VeilError::request_build(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| VeilError::request_build(format!("invalid value for {name}: {e}")))?;
        headers.insert(name, value);
    }

    Ok(request)
}
