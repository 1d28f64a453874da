use http::HeaderMap;

use super::types::PageView;

/// Query parameters checked, in order, for a referrer when neither the caller
/// nor the `Referer` header provides one
pub const REFERRER_QUERY_PARAMS: [&str; 5] = ["ref", "referer", "referrer", "source", "utm_source"];

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

impl PageView {
    /// Browser fields copied from the inbound request: user agent, language
    /// and the user-agent client hints
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            user_agent: header(headers, "user-agent"),
            accept_language: header(headers, "accept-language"),
            sec_ch_ua: header(headers, "sec-ch-ua"),
            sec_ch_ua_mobile: header(headers, "sec-ch-ua-mobile"),
            sec_ch_ua_platform: header(headers, "sec-ch-ua-platform"),
            sec_ch_ua_platform_version: header(headers, "sec-ch-ua-platform-version"),
            sec_ch_width: header(headers, "sec-ch-width"),
            sec_ch_viewport_width: header(headers, "sec-ch-viewport-width"),
            ..Self::default()
        }
    }
}

/// `explicit` if set, otherwise the `Referer` header, otherwise the first
/// non-empty of [`REFERRER_QUERY_PARAMS`].
pub fn referrer_or_fallback(explicit: &str, headers: &HeaderMap, query: &[(String, String)]) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }

    let referer = header(headers, "referer");
    if !referer.is_empty() {
        return referer;
    }

    REFERRER_QUERY_PARAMS
        .iter()
        .find_map(|param| {
            query
                .iter()
                .find(|(key, _)| key == param)
                .map(|(_, value)| value)
                .filter(|value| !value.is_empty())
        })
        .cloned()
        .unwrap_or_default()
}

/// `DNT: 1`
pub fn is_do_not_track(headers: &HeaderMap) -> bool {
    headers
        .get("dnt")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "1")
}
