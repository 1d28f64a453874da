use ipnet::IpNet;
use std::net::IpAddr;

use crate::error::{ProxyError, Result};

/// Networks of the load balancers and proxies allowed to set forwarding headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedSubnets {
    networks: Vec<IpNet>,
}

impl TrustedSubnets {
    /// Parse CIDR entries such as `10.0.0.0/8` or `2001:db8::/32`.
    ///
    /// Host bits are dropped (`10.0.0.1/8` becomes `10.0.0.0/8`). The first
    /// malformed entry fails the whole table.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let networks = entries
            .iter()
            .map(|entry| {
                let entry = entry.as_ref();
                entry
                    .parse::<IpNet>()
                    .map(|net| net.trunc())
                    .map_err(|source| ProxyError::InvalidSubnet { subnet: entry.to_string(), source })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { networks })
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.networks.iter().any(|net| net.contains(&ip))
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }
}

impl From<Vec<IpNet>> for TrustedSubnets {
    fn from(networks: Vec<IpNet>) -> Self {
        Self { networks: networks.into_iter().map(|net| net.trunc()).collect() }
    }
}
