use std::net::IpAddr;

/// Strip a `host:port` suffix from an address token.
///
/// Tokens without a colon are returned as-is. Tokens that contain a colon but
/// do not split into host and port (a bare IPv6 literal such as `2001:db8::1`)
/// are also returned unchanged. Bracketed IPv6 (`[::1]:8080`) yields the
/// address without brackets.
pub fn clean_ip(raw: &str) -> &str {
    if !raw.contains(':') {
        return raw;
    }
    split_host(raw).unwrap_or(raw)
}

fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?;
        if port.contains([':', '[', ']']) {
            return None;
        }
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains([':', '[', ']']) {
        return None;
    }
    Some(host)
}

/// Whether `ip` can identify a real internet client.
///
/// Private-use (RFC 1918, IPv6 unique local), loopback and unspecified
/// addresses are rejected. IPv4-mapped IPv6 addresses are judged by the IPv4
/// address they carry.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => !(v4.is_private() || v4.is_loopback() || v4.is_unspecified()),
        IpAddr::V6(v6) => !(v6.is_unique_local() || v6.is_loopback() || v6.is_unspecified()),
    }
}

/// Parse `value` as an IP address and keep it only if it is public.
pub fn parse_public_ip(value: &str) -> Option<IpAddr> {
    value.parse::<IpAddr>().ok().filter(|ip| is_public_ip(*ip))
}

/// String form of the candidate check applied to every header value.
pub fn is_valid_ip(value: &str) -> bool {
    parse_public_ip(value).is_some()
}
