//! Browser-impersonating connection layer.
//!
//! A [`VeilConnector`] dials a target, then completes a TLS handshake whose
//! ClientHello reproduces the wire signature of a real browser from the
//! [`profile`] registry, instead of the stack's default handshake. The
//! resulting stream plugs into a standard hyper client as its connector, so
//! everything above the handshake is ordinary HTTP.

pub mod error;
pub mod profile;
pub mod tls;
pub mod transport;

pub use error::VeilError;
pub use profile::{resolve, Browser, FingerprintProfile};
pub use tls::{HandshakeSpec, TlsVersion};
pub use transport::{VeilConnector, VeilStream, CONNECT_TIMEOUT, KEEPALIVE_PROBE};
