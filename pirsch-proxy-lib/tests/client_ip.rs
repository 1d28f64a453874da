use http::{HeaderMap, HeaderValue};
use pirsch_proxy_lib::client_ip::{ClientIpResolver, IpSource};
use pirsch_proxy_lib::config::NetworkConfig;

mod helpers;
use helpers::TestResult;

fn resolver(headers: &[&str], subnets: &[&str]) -> pirsch_proxy_lib::Result<ClientIpResolver> {
    ClientIpResolver::from_config(&NetworkConfig {
        header: headers.iter().map(|h| h.to_string()).collect(),
        subnets: subnets.iter().map(|s| s.to_string()).collect(),
    })
}

fn request_headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(*name, HeaderValue::from_static(value));
    }
    map
}

#[test]
fn highest_priority_header_wins() -> TestResult {
    let resolver = resolver(&["X-Real-IP", "Forwarded", "X-Forwarded-For"], &[])?;
    let headers = request_headers(&[
        ("x-real-ip", "103.0.53.43"),
        ("x-forwarded-for", "127.0.0.1, 23.21.45.67, 65.182.89.102"),
    ]);

    let resolved = resolver.resolve_with_source("123.45.67.89:1111", &headers);
    assert_eq!(resolved.ip, "103.0.53.43");
    assert_eq!(resolved.source, IpSource::Header("X-Real-IP"));
    Ok(())
}

#[test]
fn untrusted_peer_ignores_headers() -> TestResult {
    let resolver = resolver(&["X-Real-IP", "Forwarded", "X-Forwarded-For"], &["10.0.0.0/8"])?;
    let headers = request_headers(&[
        ("x-real-ip", "103.0.53.43"),
        ("forwarded", "for=192.0.2.60;proto=http;by=203.0.113.43"),
        ("x-forwarded-for", "127.0.0.1, 23.21.45.67, 65.182.89.102"),
    ]);

    let resolved = resolver.resolve_with_source("1.1.1.1:2222", &headers);
    assert_eq!(resolved.ip, "1.1.1.1");
    assert_eq!(resolved.source, IpSource::UntrustedPeer);
    Ok(())
}

#[test]
fn trusted_peer_uses_headers() -> TestResult {
    let resolver = resolver(&["Forwarded"], &["10.0.0.0/8"])?;
    let headers = request_headers(&[("forwarded", "for=192.0.2.60;proto=http;by=203.0.113.43")]);

    assert_eq!(resolver.resolve("10.255.255.255:443", &headers), "192.0.2.60");
    Ok(())
}

#[test]
fn falls_through_to_next_header() -> TestResult {
    let resolver = resolver(&["CF-Connecting-IP", "Forwarded", "X-Forwarded-For"], &[])?;
    let headers = request_headers(&[
        ("cf-connecting-ip", "   "),
        ("forwarded", "for=12.34.56.78, for=23.45.67.89;secret=x, for=10.1.2.3"),
        ("x-forwarded-for", "127.0.0.1, 23.21.45.67, 65.182.89.102"),
    ]);

    let resolved = resolver.resolve_with_source("123.45.67.89:1111", &headers);
    assert_eq!(resolved.ip, "65.182.89.102");
    assert_eq!(resolved.source, IpSource::Header("X-Forwarded-For"));
    Ok(())
}

#[test]
fn disabled_headers_are_never_read() -> TestResult {
    let resolver = resolver(&["True-Client-IP"], &[])?;
    let headers = request_headers(&[("x-real-ip", "103.0.53.43")]);

    let resolved = resolver.resolve_with_source("123.45.67.89:1111", &headers);
    assert_eq!(resolved.ip, "123.45.67.89");
    assert_eq!(resolved.source, IpSource::Peer);
    Ok(())
}

#[test]
fn private_candidates_fall_back_to_peer() -> TestResult {
    let resolver = resolver(&["X-Real-IP", "X-Forwarded-For"], &[])?;
    let headers = request_headers(&[
        ("x-real-ip", "127.0.0.1"),
        ("x-forwarded-for", "65.182.89.102, 192.168.1.20"),
    ]);

    assert_eq!(resolver.resolve("[2001:db8::1]:8080", &headers), "2001:db8::1");
    Ok(())
}

#[test]
fn malformed_peer_is_returned_unchanged() -> TestResult {
    let resolver = resolver(&[], &["10.0.0.0/8"])?;
    assert_eq!(resolver.resolve("not-an-address", &HeaderMap::new()), "not-an-address");
    Ok(())
}
