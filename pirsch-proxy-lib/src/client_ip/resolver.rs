use http::HeaderMap;
use std::net::{IpAddr, SocketAddr};
use tracing::warn;

use super::header::HeaderParser;
use super::ip::clean_ip;
use super::subnets::TrustedSubnets;
use crate::config::NetworkConfig;
use crate::error::{ProxyError, Result};

/// Read access to request headers by name
pub trait HeaderLookup {
    /// First value of `name`, `None` when absent or not valid UTF-8
    fn get(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for HeaderMap {
    fn get(&self, name: &str) -> Option<&str> {
        HeaderMap::get(self, name).and_then(|value| value.to_str().ok())
    }
}

/// Where a resolved address came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpSource {
    /// The TCP peer, no header produced a usable address
    Peer,
    /// The TCP peer is outside the trusted subnets, headers were ignored
    UntrustedPeer,
    /// A forwarding header
    Header(&'static str),
}

impl IpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peer => "peer",
            Self::UntrustedPeer => "untrusted_peer",
            Self::Header(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIp {
    pub ip: String,
    pub source: IpSource,
}

/// Resolves the originating client address of a request.
///
/// Built once from configuration and shared read-only between connections.
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    subnets: TrustedSubnets,
    headers: Vec<HeaderParser>,
}

impl ClientIpResolver {
    /// `headers` is the priority order: the first header present that yields
    /// a public address wins.
    pub fn new(subnets: TrustedSubnets, headers: Vec<HeaderParser>) -> Self {
        Self { subnets, headers }
    }

    /// Build from the `[network]` section.
    ///
    /// Unknown header names and malformed subnets are fatal.
    pub fn from_config(network: &NetworkConfig) -> Result<Self> {
        let headers = network
            .header
            .iter()
            .map(|name| {
                HeaderParser::from_name(name).ok_or_else(|| ProxyError::UnknownIpHeader(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let subnets = TrustedSubnets::parse(&network.subnets)?;

        // Empty subnets disable the peer check entirely, any client can spoof these headers
        if subnets.is_empty() && !headers.is_empty() {
            let names: Vec<_> = headers.iter().map(HeaderParser::header).collect();
            warn!(
                headers = ?names,
                "no trusted subnets configured, forwarding headers are accepted from every peer"
            );
        }

        Ok(Self::new(subnets, headers))
    }

    pub fn headers(&self) -> &[HeaderParser] {
        &self.headers
    }

    pub fn subnets(&self) -> &TrustedSubnets {
        &self.subnets
    }

    /// Resolve the client IP from the peer address (`host:port`) and headers.
    ///
    /// Never fails: an unparsable peer address is returned as given (minus a
    /// port, if one could be split off).
    pub fn resolve<H: HeaderLookup + ?Sized>(&self, remote_addr: &str, headers: &H) -> String {
        self.resolve_with_source(remote_addr, headers).ip
    }

    pub fn resolve_with_source<H: HeaderLookup + ?Sized>(
        &self,
        remote_addr: &str,
        headers: &H,
    ) -> ResolvedIp {
        let peer = clean_ip(remote_addr);
        self.resolve_peer(peer, peer.parse().ok(), headers)
    }

    /// Same as [`resolve_with_source`](Self::resolve_with_source) for an
    /// accepted TCP connection.
    pub fn resolve_socket<H: HeaderLookup + ?Sized>(
        &self,
        peer: SocketAddr,
        headers: &H,
    ) -> ResolvedIp {
        let ip = peer.ip().to_canonical();
        self.resolve_peer(&ip.to_string(), Some(ip), headers)
    }

    fn resolve_peer<H: HeaderLookup + ?Sized>(
        &self,
        peer: &str,
        peer_ip: Option<IpAddr>,
        headers: &H,
    ) -> ResolvedIp {
        if !self.subnets.is_empty() && !peer_ip.is_some_and(|ip| self.subnets.contains(ip)) {
            return ResolvedIp { ip: peer.to_string(), source: IpSource::UntrustedPeer };
        }

        for parser in &self.headers {
            let Some(value) = headers.get(parser.header()) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            if let Some(ip) = parser.parse(value) {
                return ResolvedIp { ip: ip.to_string(), source: IpSource::Header(parser.header()) };
            }
        }

        ResolvedIp { ip: peer.to_string(), source: IpSource::Peer }
    }
}
