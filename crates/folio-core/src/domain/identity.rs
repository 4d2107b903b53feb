use std::fmt;

/// Address used when the request carries no forwarded address.
pub const DEFAULT_CLIENT_ADDRESS: &str = "127.0.0.1";

/// The key a caller is rate limited under.
///
/// Derived from the `X-Forwarded-For` header. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Build an identity from the raw `X-Forwarded-For` value.
    ///
    /// Each proxy appends the address it received the request from, so only
    /// entries written by our own proxies can be trusted. `trusted_hops`
    /// counts those proxies: the entry that many positions from the right is
    /// the client. A shorter chain falls back to its left-most entry.
    pub fn from_forwarded_for(header: Option<&str>, trusted_hops: usize) -> Self {
        let address = header
            .and_then(|value| value.rsplit(',').take(trusted_hops.max(1)).last())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CLIENT_ADDRESS);

        Self(address.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self(DEFAULT_CLIENT_ADDRESS.to_string())
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
