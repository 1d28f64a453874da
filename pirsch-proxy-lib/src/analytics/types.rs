use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A page view as accepted by the hit and session endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageView {
    pub url: String,
    pub ip: String,
    pub user_agent: String,
    pub accept_language: String,
    pub sec_ch_ua: String,
    pub sec_ch_ua_mobile: String,
    pub sec_ch_ua_platform: String,
    pub sec_ch_ua_platform_version: String,
    pub sec_ch_width: String,
    pub sec_ch_viewport_width: String,
    pub title: String,
    pub referrer: String,
    pub screen_width: i32,
    pub screen_height: i32,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

/// Custom event: the page view it happened on plus name, duration and metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Event {
    #[serde(flatten)]
    pub page_view: PageView,
    #[serde(rename = "event_name")]
    pub name: String,
    #[serde(rename = "event_duration")]
    pub duration_seconds: i64,
    #[serde(rename = "event_meta", skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// Domain the credentials belong to
#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub hostname: String,
}
