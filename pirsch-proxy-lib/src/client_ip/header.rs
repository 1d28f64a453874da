use std::net::IpAddr;

use super::ip::{clean_ip, parse_public_ip};

/// Canonical names of the supported forwarding headers
pub mod names {
    pub const CF_CONNECTING_IP: &str = "CF-Connecting-IP";
    pub const TRUE_CLIENT_IP: &str = "True-Client-IP";
    pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
    pub const FORWARDED: &str = "Forwarded";
    pub const X_REAL_IP: &str = "X-Real-IP";
}

/// A forwarding header together with the rule used to read an address out of it.
///
/// Variants are parsing rules, not headers: several headers share the
/// last-in-list rule and only differ by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderParser {
    /// Comma separated chain, the rightmost entry wins
    LastInList { header: &'static str },
    /// RFC 7239 `Forwarded`, `for=` of the last hop
    Forwarded { header: &'static str },
    /// A single address
    SingleValue { header: &'static str },
}

const BUILTIN: [HeaderParser; 5] = [
    HeaderParser::LastInList { header: names::CF_CONNECTING_IP },
    HeaderParser::LastInList { header: names::TRUE_CLIENT_IP },
    HeaderParser::LastInList { header: names::X_FORWARDED_FOR },
    HeaderParser::Forwarded { header: names::FORWARDED },
    HeaderParser::SingleValue { header: names::X_REAL_IP },
];

impl HeaderParser {
    /// All built-in parsers
    pub fn builtin() -> &'static [HeaderParser] {
        &BUILTIN
    }

    /// Look up a built-in parser by header name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTIN
            .iter()
            .find(|parser| parser.header().eq_ignore_ascii_case(name))
            .copied()
    }

    pub fn header(&self) -> &'static str {
        match self {
            Self::LastInList { header }
            | Self::Forwarded { header }
            | Self::SingleValue { header } => header,
        }
    }

    /// Extract a public client address from a raw header value
    pub fn parse(&self, value: &str) -> Option<IpAddr> {
        match self {
            Self::LastInList { .. } => parse_last_in_list(value),
            Self::Forwarded { .. } => parse_forwarded(value),
            Self::SingleValue { .. } => parse_single_value(value),
        }
    }
}

/// `X-Forwarded-For` style: `client, proxy1, proxy2`.
///
/// Proxies append on forward, so the last entry was written by the hop
/// closest to us.
pub fn parse_last_in_list(value: &str) -> Option<IpAddr> {
    let last = value.rsplit(',').next()?;
    parse_public_ip(clean_ip(last.trim()))
}

/// RFC 7239: `for=192.0.2.60;proto=http;by=203.0.113.43, for=...`.
///
/// Only the last hop is considered, and within it the first `for` parameter.
/// The key match is case sensitive.
pub fn parse_forwarded(value: &str) -> Option<IpAddr> {
    let hop = value.rsplit(',').next()?;
    let node = hop.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == "for").then_some(value)
    })?;
    let node = clean_ip(node.trim().trim_matches('"'));
    // Port-less IPv6 nodes stay bracketed: `for="[2001:db8::17]"`
    let node = node
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(node);
    parse_public_ip(node)
}

/// `X-Real-IP`: one address, optionally with a port.
pub fn parse_single_value(value: &str) -> Option<IpAddr> {
    parse_public_ip(clean_ip(value.trim()))
}
