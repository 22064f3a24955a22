use crate::tls::HandshakeSpec;

/// The closed set of impersonation targets. New browsers are added by
/// extending this enum and the [`PROFILES`] table, not by branching logic
/// elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
    Ios,
    Safari,
    /// Descriptor regenerated fresh for every connection.
    Random,
}

/// A named fingerprint profile: the handshake descriptor source plus the
/// default identification header sent when the caller supplies none.
///
/// Profiles are statically enumerated and read-only; nothing is created or
/// destroyed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintProfile {
    pub name: &'static str,
    pub browser: Browser,
    pub user_agent: &'static str,
}

const UA_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const UA_FIREFOX: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0";
const UA_IOS: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
const UA_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/17.1 Safari/605.1.15";

const CHROME: FingerprintProfile = FingerprintProfile {
    name: "chrome",
    browser: Browser::Chrome,
    user_agent: UA_CHROME,
};

/// Static profile table. `chrome` doubles as the fallback for unknown names.
static PROFILES: &[FingerprintProfile] = &[
    CHROME,
    FingerprintProfile {
        name: "firefox",
        browser: Browser::Firefox,
        user_agent: UA_FIREFOX,
    },
    FingerprintProfile {
        name: "ios",
        browser: Browser::Ios,
        user_agent: UA_IOS,
    },
    FingerprintProfile {
        name: "safari",
        browser: Browser::Safari,
        user_agent: UA_SAFARI,
    },
    FingerprintProfile {
        name: "random",
        browser: Browser::Random,
        // The wire bytes vary per connection; the header stays Chrome-like,
        // the majority browser.
        user_agent: UA_CHROME,
    },
];

/// Look up a profile by name, case-insensitively.
///
/// Unknown names resolve to the `chrome` profile with `false` in the second
/// slot so callers can log the fallback; resolution itself never fails.
pub fn resolve(name: &str) -> (FingerprintProfile, bool) {
    for profile in PROFILES {
        if profile.name.eq_ignore_ascii_case(name) {
            return (*profile, true);
        }
    }
    (CHROME, false)
}

impl FingerprintProfile {
    /// The handshake descriptor for this profile.
    ///
    /// Deterministic for the named browsers; `random` returns a freshly
    /// shuffled descriptor on every call, so no two connections using it
    /// necessarily share wire bytes.
    pub fn descriptor(&self) -> HandshakeSpec {
        match self.browser {
            Browser::Chrome => HandshakeSpec::chrome(),
            Browser::Firefox => HandshakeSpec::firefox(),
            Browser::Ios => HandshakeSpec::ios(),
            Browser::Safari => HandshakeSpec::safari(),
            Browser::Random => HandshakeSpec::randomized(),
        }
    }
}
