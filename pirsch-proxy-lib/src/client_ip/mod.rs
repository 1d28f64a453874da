//! Real client IP resolution.
//!
//! A request may reach the proxy directly or through any number of load
//! balancers and CDNs, each of which records the address it saw in a
//! forwarding header of its own flavour. [`ClientIpResolver`] decides which of
//! those signals to believe: headers are only consulted when the TCP peer is a
//! trusted proxy (or no trusted subnets are configured at all), they are tried
//! in the configured priority order, and every extracted candidate must be a
//! public address before it is accepted.

mod header;
mod ip;
mod resolver;
mod subnets;

pub use header::{names, parse_forwarded, parse_last_in_list, parse_single_value, HeaderParser};
pub use ip::{clean_ip, is_public_ip, is_valid_ip, parse_public_ip};
pub use resolver::{ClientIpResolver, HeaderLookup, IpSource, ResolvedIp};
pub use subnets::TrustedSubnets;
