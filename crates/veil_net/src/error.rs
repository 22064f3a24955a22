use thiserror::Error;

/// Failure taxonomy for a single fingerprinted request.
///
/// Each variant names the phase that failed, so callers can tell a network
/// problem apart from a TLS negotiation problem or a later I/O failure.
/// Variants carry plain strings and are `Clone`: the executor needs to lift
/// a connector failure back out of hyper's error wrapper intact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VeilError {
    /// The TCP connection to the target could not be established.
    #[error("dial {addr}: {message}")]
    Dial { addr: String, message: String },

    /// The connection came up but the peer rejected our ClientHello, or the
    /// TLS negotiation failed for any other reason.
    #[error("tls handshake with {host}: {message}")]
    Handshake { host: String, message: String },

    /// The request description itself was malformed (method, URL, headers).
    #[error("request build: {message}")]
    RequestBuild { message: String },

    /// I/O failure after a completed handshake: reset connection, response
    /// timeout, body read failure.
    #[error("transport: {message}")]
    Transport { message: String },
}

impl VeilError {
    pub fn dial(addr: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Dial {
            addr: addr.into(),
            message: err.to_string(),
        }
    }

    pub fn handshake(host: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Handshake {
            host: host.into(),
            message: err.to_string(),
        }
    }

    pub fn request_build(err: impl std::fmt::Display) -> Self {
        Self::RequestBuild {
            message: err.to_string(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}
