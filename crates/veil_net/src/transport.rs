use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use hyper::client::connect::{Connected, Connection};
use hyper::service::Service;
use hyper::Uri;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_boring::SslStream;
use tracing::debug;

use crate::error::VeilError;
use crate::profile::FingerprintProfile;

/// Bound on establishing the raw TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP keep-alive probe interval on the established connection.
pub const KEEPALIVE_PROBE: Duration = Duration::from_secs(30);

/// Connection factory that dials the target and completes a TLS handshake
/// whose ClientHello matches the configured fingerprint profile.
///
/// Implements `hyper::service::Service<Uri>`, so it plugs into a stock hyper
/// client as its connector: every other piece of HTTP behavior (request
/// writing, response parsing, timeouts) is hyper's, untouched. Only the
/// handshake is ours.
#[derive(Debug, Clone)]
pub struct VeilConnector {
    profile: FingerprintProfile,
    verify_certificates: bool,
    connect_timeout: Duration,
}

impl VeilConnector {
    /// Certificate verification starts out disabled: scraping targets are
    /// routinely self-signed or misconfigured, and server identity is not
    /// what this tool is for. Opt back in with [`Self::verify_certificates`].
    pub fn new(profile: FingerprintProfile) -> Self {
        Self {
            profile,
            verify_certificates: false,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Enable strict certificate chain and hostname verification.
    pub fn verify_certificates(mut self, enabled: bool) -> Self {
        self.verify_certificates = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn profile(&self) -> &FingerprintProfile {
        &self.profile
    }

    /// Dial, then handshake. `Dial` and `Handshake` failures stay distinct
    /// so callers can tell which stage broke.
    pub async fn connect(&self, dst: &Uri) -> Result<VeilStream, VeilError> {
        let authority = dst
            .authority()
            .ok_or_else(|| VeilError::request_build(format!("url has no authority: {dst}")))?
            .to_string();
        // SNI is the host portion; if it cannot be split out, fall back to
        // the full authority string verbatim.
        let host = dst.host().unwrap_or(authority.as_str()).to_string();

        let tls = match dst.scheme_str() {
            Some("https") | None => true,
            Some("http") => false,
            Some(other) => {
                return Err(VeilError::request_build(format!(
                    "unsupported scheme: {other}"
                )))
            }
        };
        let port = dst.port_u16().unwrap_or(if tls { 443 } else { 80 });

        let stream = self.dial(&host, port).await?;
        if !tls {
            return Ok(VeilStream::Plain(stream));
        }

        // Fresh descriptor per connection: for `random` this is where the
        // wire bytes change between requests.
        let spec = self.profile.descriptor();
        let connector = spec
            .connector(self.verify_certificates)
            .map_err(|e| VeilError::handshake(&host, e))?;
        let mut config = connector
            .configure()
            .map_err(|e| VeilError::handshake(&host, e))?;
        if !self.verify_certificates {
            config.set_verify_hostname(false);
        }

        // A failed handshake drops the stream here, closing the raw socket.
        let tls_stream = tokio_boring::connect(config, &host, stream)
            .await
            .map_err(|e| VeilError::handshake(&host, e))?;

        debug!(
            host = %host,
            profile = self.profile.name,
            version = tls_stream.ssl().version_str(),
            cipher = tls_stream
                .ssl()
                .current_cipher()
                .map(|c| c.name())
                .unwrap_or("unknown"),
            "tls handshake complete"
        );

        Ok(VeilStream::Tls(tls_stream))
    }

    async fn dial(&self, host: &str, port: u16) -> Result<TcpStream, VeilError> {
        let addr = format!("{host}:{port}");

        let stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                VeilError::dial(
                    &addr,
                    format!("connect timed out after {}s", self.connect_timeout.as_secs()),
                )
            })?
            .map_err(|e| VeilError::dial(&addr, e))?;

        stream
            .set_nodelay(true)
            .map_err(|e| VeilError::dial(&addr, e))?;
        let sock = SockRef::from(&stream);
        sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(KEEPALIVE_PROBE))
            .map_err(|e| VeilError::dial(&addr, e))?;

        Ok(stream)
    }
}

impl Service<Uri> for VeilConnector {
    type Response = VeilStream;
    type Error = VeilError;
    type Future = Pin<Box<dyn Future<Output = Result<VeilStream, VeilError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let connector = self.clone();
        Box::pin(async move { connector.connect(&dst).await })
    }
}

/// A live, handshake-complete connection, owned by exactly one in-flight
/// request and never reused.
#[derive(Debug)]
pub enum VeilStream {
    /// Raw TCP, for plain `http://` targets.
    Plain(TcpStream),
    /// Fingerprinted TLS session.
    Tls(SslStream<TcpStream>),
}

impl Connection for VeilStream {
    fn connected(&self) -> Connected {
        match self {
            VeilStream::Plain(_) => Connected::new(),
            VeilStream::Tls(stream) => {
                let connected = Connected::new();
                // Tell hyper to speak HTTP/2 when ALPN negotiated it.
                if stream.ssl().selected_alpn_protocol() == Some(b"h2") {
                    connected.negotiated_h2()
                } else {
                    connected
                }
            }
        }
    }
}

impl AsyncRead for VeilStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            VeilStream::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            VeilStream::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for VeilStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            VeilStream::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            VeilStream::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            VeilStream::Plain(stream) => Pin::new(stream).poll_flush(cx),
            VeilStream::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            VeilStream::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            VeilStream::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::resolve;

    #[tokio::test]
    async fn refused_connection_is_a_dial_error() {
        // Bind a port, then free it so the connect is refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (profile, _) = resolve("chrome");
        let connector = VeilConnector::new(profile);
        let uri: Uri = format!("https://127.0.0.1:{port}/").parse().unwrap();

        let err = connector.connect(&uri).await.unwrap_err();
        assert!(matches!(err, VeilError::Dial { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn non_tls_peer_is_a_handshake_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n")
                .await
                .unwrap();
            // The client must tear the connection down after the failed
            // handshake; a read that never completes would hang here.
            let mut sink = Vec::new();
            let _ = socket.read_to_end(&mut sink).await;
        });

        let (profile, _) = resolve("firefox");
        let connector = VeilConnector::new(profile);
        let uri: Uri = format!("https://127.0.0.1:{port}/").parse().unwrap();

        let err = connector.connect(&uri).await.unwrap_err();
        assert!(matches!(err, VeilError::Handshake { .. }), "got {err:?}");

        timeout(Duration::from_secs(5), server)
            .await
            .expect("peer connection was not closed")
            .unwrap();
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected_up_front() {
        let (profile, _) = resolve("chrome");
        let connector = VeilConnector::new(profile);
        let uri: Uri = "ftp://example.com/".parse().unwrap();

        let err = connector.connect(&uri).await.unwrap_err();
        assert!(matches!(err, VeilError::RequestBuild { .. }));
    }
}
