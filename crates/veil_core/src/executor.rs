use std::error::Error as _;
use std::time::Duration;

use hyper::body::Bytes;
use hyper::client::Client;
use hyper::{Body, Request, Response};
use tokio::time::{timeout_at, Instant};
use veil_net::{VeilConnector, VeilError};

/// Bound on the full request lifecycle: dial, handshake, request, response
/// head, and body. Independent of the connector's own connect timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Drive one request over the fingerprinting transport.
///
/// The hyper client is built with an idle pool size of zero: a connection
/// serves exactly one request and is never reused, so no handshake state
/// leaks across invocations. No retries; one request, one outcome.
///
/// The deadline handed back is the point at which the whole operation must
/// be finished, body included. Drain the body through [`read_body`] with it
/// so a peer that stalls mid-body cannot hold the caller past the budget.
pub async fn execute(
    request: Request<Body>,
    connector: VeilConnector,
) -> Result<(Response<Body>, Instant), VeilError> {
    let deadline = Instant::now() + REQUEST_TIMEOUT;
    let client = Client::builder()
        .pool_max_idle_per_host(0)
        .build::<_, Body>(connector);

    match timeout_at(deadline, client.request(request)).await {
        Err(_) => Err(VeilError::transport(format!(
            "no response within {}s",
            REQUEST_TIMEOUT.as_secs()
        ))),
        Ok(Ok(response)) => Ok((response, deadline)),
        Ok(Err(err)) => Err(unwrap_phase(err)),
    }
}

/// Collect the response body, bounded by the deadline from [`execute`].
///
/// The head arriving does not stop the clock: a server that sends its
/// headers and then stalls mid-body surfaces as a `Transport` error when
/// the remaining budget runs out, instead of hanging the caller.
pub async fn read_body(body: Body, deadline: Instant) -> Result<Bytes, VeilError> {
    match timeout_at(deadline, hyper::body::to_bytes(body)).await {
        Err(_) => Err(VeilError::transport(format!(
            "body not complete within {}s",
            REQUEST_TIMEOUT.as_secs()
        ))),
        Ok(result) => result.map_err(VeilError::transport),
    }
}

/// hyper wraps connector failures in its own error type; walk the source
/// chain to recover the original dial/handshake phase before falling back
/// to a generic transport error.
fn unwrap_phase(err: hyper::Error) -> VeilError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(veil) = cause.downcast_ref::<VeilError>() {
            return veil.clone();
        }
        source = cause.source();
    }
    VeilError::transport(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapper(VeilError);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped: {}", self.0)
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn connector_errors_survive_wrapping() {
        let inner = VeilError::handshake("example.com", "alert 40");
        let wrapped = Wrapper(inner.clone());

        // Same walk `unwrap_phase` performs, against a hand-built chain.
        let mut source: Option<&(dyn std::error::Error + 'static)> = wrapped.source();
        let mut recovered = None;
        while let Some(cause) = source {
            if let Some(veil) = cause.downcast_ref::<VeilError>() {
                recovered = Some(veil.clone());
                break;
            }
            source = cause.source();
        }
        assert_eq!(recovered, Some(inner));
    }

    #[tokio::test]
    async fn expired_deadline_cuts_off_the_body() {
        let (mut sender, body) = Body::channel();
        sender
            .send_data(Bytes::from_static(b"partial"))
            .await
            .unwrap();
        // The sender stays alive, so the body never completes on its own.

        let err = read_body(body, Instant::now() + Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, VeilError::Transport { .. }), "got {err:?}");
        drop(sender);
    }
}
