//! Single-shot HTTPS requests over a browser-impersonating TLS handshake.
//!
//! [`send`] is the one-call path: resolve the profile, assemble the request,
//! dial and handshake through [`veil_net`], return the response together
//! with the deadline the rest of the operation must respect. [`send_with`]
//! is the same path with a hook for connector configuration (strict
//! certificate verification, custom connect timeout).

pub mod executor;
pub mod request;

use hyper::{Body, Response};
use tokio::time::Instant;
use tracing::warn;

pub use executor::{read_body, REQUEST_TIMEOUT};
pub use request::RequestParams;
pub use veil_net::{resolve, Browser, FingerprintProfile, VeilConnector, VeilError, VeilStream};

/// Perform one request with the profile named in `params`.
///
/// An unrecognized profile name is not fatal: it falls back to chrome and is
/// logged. Everything else surfaces as a [`VeilError`] naming the phase that
/// failed. Drain the response body through [`read_body`] with the returned
/// deadline so the overall time budget covers it too.
pub async fn send(params: &RequestParams) -> Result<(Response<Body>, Instant), VeilError> {
    send_with(params, |connector| connector).await
}

/// [`send`], with the connector passed through `configure` before use.
pub async fn send_with<F>(
    params: &RequestParams,
    configure: F,
) -> Result<(Response<Body>, Instant), VeilError>
where
    F: FnOnce(VeilConnector) -> VeilConnector,
{
    let (profile, matched) = resolve(&params.profile);
    if !matched {
        warn!(
            requested = %params.profile,
            fallback = profile.name,
            "unknown fingerprint profile, using fallback"
        );
    }

    let request = request::assemble(params, &profile)?;
    let connector = configure(VeilConnector::new(profile));
    executor::execute(request, connector).await
}
