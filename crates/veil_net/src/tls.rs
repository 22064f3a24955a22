use boring::error::ErrorStack;
use boring::ssl::{
    SslConnector, SslMethod, SslOptions, SslSessionCacheMode, SslVerifyMode, SslVersion,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// TLS protocol versions a descriptor may use as a range endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls10,
    /// No built-in profile pins an endpoint here; it is still offered on the
    /// wire whenever a range spans it (safari's 1.0 through 1.3 does).
    Tls11,
    Tls12,
    Tls13,
}

impl From<TlsVersion> for SslVersion {
    fn from(version: TlsVersion) -> SslVersion {
        match version {
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }
}

/// Chrome's TLS 1.2 cipher offer, by OpenSSL name, in wire order.
/// The TLS 1.3 suites (AES-128, AES-256, ChaCha20) are pinned by BoringSSL
/// in exactly the order every mainstream browser sends, so they are not part
/// of the descriptor.
const CHROME_CIPHERS: &[&str] = &[
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

/// Firefox ranks ChaCha20 above the AES-256 GCM suites.
const FIREFOX_CIPHERS: &[&str] = &[
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
];

/// Apple stacks put the ECDSA suites first and prefer AES-256 over AES-128.
const SAFARI_CIPHERS: &[&str] = &[
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES256-SHA",
    "ECDHE-RSA-AES128-SHA",
    "AES256-GCM-SHA384",
    "AES128-GCM-SHA256",
    "AES256-SHA",
    "AES128-SHA",
];

const CHROME_SIGALGS: &[&str] = &[
    "ECDSA+SHA256",
    "RSA-PSS+SHA256",
    "RSA+SHA256",
    "ECDSA+SHA384",
    "RSA-PSS+SHA384",
    "RSA+SHA384",
    "RSA-PSS+SHA512",
    "RSA+SHA512",
];

const FIREFOX_SIGALGS: &[&str] = &[
    "ECDSA+SHA256",
    "ECDSA+SHA384",
    "ECDSA+SHA512",
    "RSA-PSS+SHA256",
    "RSA-PSS+SHA384",
    "RSA-PSS+SHA512",
    "RSA+SHA256",
    "RSA+SHA384",
    "RSA+SHA512",
];

const SAFARI_SIGALGS: &[&str] = &[
    "ECDSA+SHA256",
    "RSA-PSS+SHA256",
    "RSA+SHA256",
    "ECDSA+SHA384",
    "RSA-PSS+SHA384",
    "RSA+SHA384",
    "RSA-PSS+SHA512",
    "RSA+SHA512",
];

const ALPN_H2_H1: &[&str] = &["h2", "http/1.1"];

/// The fingerprint descriptor: the ordered TLS parameters that, sent on the
/// wire, reproduce a specific browser's ClientHello signature.
///
/// Field order inside each list is the offer order. Descriptors for named
/// browsers are deterministic and compare equal across constructions;
/// [`HandshakeSpec::randomized`] is different on (almost) every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSpec {
    pub min_version: TlsVersion,
    pub max_version: TlsVersion,
    /// TLS 1.2 cipher suites by OpenSSL name, in offer order.
    pub ciphers: Vec<&'static str>,
    /// Supported groups (elliptic curves), in offer order.
    pub groups: Vec<&'static str>,
    /// Signature algorithms, in offer order.
    pub sigalgs: Vec<&'static str>,
    /// ALPN protocols, in offer order.
    pub alpn: Vec<&'static str>,
    /// Insert GREASE values (RFC 8701). Chrome and Safari do, Firefox does not.
    pub grease: bool,
    /// Shuffle extension order per connection, as Chrome does since 110.
    pub permute_extensions: bool,
    /// Offer the session_ticket extension.
    pub session_ticket: bool,
    /// Offer the status_request (OCSP stapling) extension.
    pub ocsp_stapling: bool,
    /// Offer the signed_certificate_timestamp extension.
    pub signed_cert_timestamps: bool,
}

impl HandshakeSpec {
    pub fn chrome() -> Self {
        Self {
            min_version: TlsVersion::Tls12,
            max_version: TlsVersion::Tls13,
            ciphers: CHROME_CIPHERS.to_vec(),
            groups: vec!["X25519", "P-256", "P-384"],
            sigalgs: CHROME_SIGALGS.to_vec(),
            alpn: ALPN_H2_H1.to_vec(),
            grease: true,
            permute_extensions: true,
            session_ticket: true,
            ocsp_stapling: true,
            signed_cert_timestamps: true,
        }
    }

    pub fn firefox() -> Self {
        Self {
            min_version: TlsVersion::Tls12,
            max_version: TlsVersion::Tls13,
            ciphers: FIREFOX_CIPHERS.to_vec(),
            groups: vec!["X25519", "P-256", "P-384", "P-521"],
            sigalgs: FIREFOX_SIGALGS.to_vec(),
            alpn: ALPN_H2_H1.to_vec(),
            grease: false,
            permute_extensions: false,
            session_ticket: true,
            ocsp_stapling: true,
            signed_cert_timestamps: false,
        }
    }

    pub fn safari() -> Self {
        Self {
            // Safari still advertises the legacy versions in supported_versions.
            min_version: TlsVersion::Tls10,
            max_version: TlsVersion::Tls13,
            ciphers: SAFARI_CIPHERS.to_vec(),
            groups: vec!["X25519", "P-256", "P-384", "P-521"],
            sigalgs: SAFARI_SIGALGS.to_vec(),
            alpn: ALPN_H2_H1.to_vec(),
            grease: true,
            permute_extensions: false,
            session_ticket: false,
            ocsp_stapling: true,
            signed_cert_timestamps: true,
        }
    }

    pub fn ios() -> Self {
        // Mobile Safari shares the desktop cipher stack but pins TLS 1.2+
        // and keeps session tickets on.
        Self {
            min_version: TlsVersion::Tls12,
            session_ticket: true,
            ..Self::safari()
        }
    }

    /// A fresh descriptor with shuffled orderings. Two successive calls
    /// produce different wire bytes with overwhelming probability.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        let mut ciphers = CHROME_CIPHERS.to_vec();
        ciphers.shuffle(&mut rng);

        let mut groups = vec!["X25519", "P-256"];
        for extra in ["P-384", "P-521"] {
            if rng.gen_bool(0.5) {
                groups.push(extra);
            }
        }

        let alpn = if rng.gen_bool(0.8) {
            ALPN_H2_H1.to_vec()
        } else {
            vec!["http/1.1"]
        };

        Self {
            min_version: TlsVersion::Tls12,
            max_version: TlsVersion::Tls13,
            ciphers,
            groups,
            sigalgs: CHROME_SIGALGS.to_vec(),
            alpn,
            grease: rng.gen_bool(0.5),
            permute_extensions: true,
            session_ticket: rng.gen_bool(0.5),
            ocsp_stapling: rng.gen_bool(0.5),
            signed_cert_timestamps: rng.gen_bool(0.5),
        }
    }

    /// Build a BoringSSL connector that sends this descriptor on the wire.
    ///
    /// Certificate verification defaults to off for scraping targets with
    /// self-signed or misconfigured chains; pass `verify_certificates = true`
    /// to get strict chain verification instead.
    pub fn connector(&self, verify_certificates: bool) -> Result<SslConnector, ErrorStack> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())?;

        builder.set_min_proto_version(Some(self.min_version.into()))?;
        builder.set_max_proto_version(Some(self.max_version.into()))?;
        builder.set_cipher_list(&self.ciphers.join(":"))?;
        builder.set_curves_list(&self.groups.join(":"))?;
        builder.set_sigalgs_list(&self.sigalgs.join(":"))?;

        if !self.alpn.is_empty() {
            builder.set_alpn_protos(&alpn_wire(&self.alpn))?;
        }

        builder.set_grease_enabled(self.grease);
        builder.set_permute_extensions(self.permute_extensions);

        if self.session_ticket {
            builder.clear_options(SslOptions::NO_TICKET);
        } else {
            builder.set_options(SslOptions::NO_TICKET);
        }
        if self.ocsp_stapling {
            builder.enable_ocsp_stapling();
        }
        if self.signed_cert_timestamps {
            builder.enable_signed_cert_timestamps();
        }

        if !verify_certificates {
            builder.set_verify(SslVerifyMode::NONE);
        }

        // One connection per request; no resumption state to carry over.
        builder.set_session_cache_mode(SslSessionCacheMode::OFF);

        Ok(builder.build())
    }
}

/// Encode an ALPN protocol list into the length-prefixed wire format
/// `set_alpn_protos` expects.
fn alpn_wire(protocols: &[&str]) -> Vec<u8> {
    let mut wire = Vec::new();
    for proto in protocols {
        wire.push(proto.len() as u8);
        wire.extend_from_slice(proto.as_bytes());
    }
    wire
}
