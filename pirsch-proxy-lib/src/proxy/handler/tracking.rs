use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::analytics::{
    endpoints, is_do_not_track, referrer_or_fallback, AnalyticsClient, AnalyticsError, Event,
    PageView,
};
use crate::proxy::context::AppState;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::{full_body, synthetic_response, RespBody};

/// Upper bound for a buffered event body
const MAX_EVENT_BODY_BYTES: usize = 64 * 1024;

type Query = Vec<(String, String)>;

fn parse_query(uri: &Uri) -> Query {
    form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

/// First value of `name`, empty when absent
fn query_value<'q>(query: &'q Query, name: &str) -> &'q str {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map_or("", |(_, value)| value.as_str())
}

/// Screen sizes arrive as 16-bit integers; anything else counts as unknown
fn parse_dimension(value: &str) -> i32 {
    value.parse::<i16>().map(i32::from).unwrap_or(0)
}

fn url_or_request_uri(url: &str, uri: &Uri) -> String {
    if url.is_empty() {
        uri.to_string()
    } else {
        url.to_string()
    }
}

fn client_ip(headers: &HeaderMap, peer: SocketAddr, state: &AppState) -> String {
    let resolved = state.resolver.resolve_socket(peer, headers);
    if let Some(m) = &state.metrics {
        m.record_client_ip_source(resolved.source.as_str());
    }
    resolved.ip
}

/// Send `payload` through every client in order, stopping at the first error
async fn fan_out<'a, T, F, Fut>(
    state: &'a AppState,
    endpoint: &'static str,
    payload: &'a T,
    send: F,
) -> HttpResult<()>
where
    T: ?Sized,
    F: Fn(&'a AnalyticsClient, &'a T) -> Fut,
    Fut: Future<Output = Result<(), AnalyticsError>>,
{
    for client in &state.clients {
        let start = Instant::now();
        let result = send(client, payload).await;

        if let Some(m) = &state.metrics {
            m.record_upstream_request(
                endpoint,
                start.elapsed().as_secs_f64(),
                result.as_ref().err().map(AnalyticsError::error_type),
            );
        }

        if let Err(e) = result {
            error!(error = %e, client_id = %client.id(), endpoint, "error sending to analytics API");
            return Err(HttpError::Upstream(e.to_string()));
        }
    }
    Ok(())
}

pub(super) async fn page_view<B>(
    req: Request<B>,
    peer: SocketAddr,
    state: &AppState,
) -> HttpResult<Response<RespBody>> {
    let query = parse_query(req.uri());
    let headers = req.headers();

    let page_view = PageView {
        url: url_or_request_uri(query_value(&query, "url"), req.uri()),
        ip: client_ip(headers, peer, state),
        title: query_value(&query, "t").to_string(),
        referrer: referrer_or_fallback(query_value(&query, "ref"), headers, &query),
        screen_width: parse_dimension(query_value(&query, "w")),
        screen_height: parse_dimension(query_value(&query, "h")),
        ..PageView::from_headers(headers)
    };

    fan_out(state, endpoints::HIT, &page_view, AnalyticsClient::page_view).await?;
    Ok(synthetic_response(StatusCode::OK))
}

/// JSON body posted by the tracking script for custom events
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventRequest {
    url: String,
    title: String,
    referrer: String,
    screen_width: i32,
    screen_height: i32,
    event_name: String,
    event_duration: i64,
    event_meta: HashMap<String, String>,
}

pub(super) async fn event<B>(
    req: Request<B>,
    peer: SocketAddr,
    state: &AppState,
) -> HttpResult<Response<RespBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let body = Limited::new(body, MAX_EVENT_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                HttpError::PayloadTooLarge
            } else {
                HttpError::InvalidBody(e.to_string())
            }
        })?
        .to_bytes();
    let payload: EventRequest =
        serde_json::from_slice(&body).map_err(|e| HttpError::InvalidPayload(e.to_string()))?;

    if is_do_not_track(&parts.headers) {
        debug!(?peer, "do not track, event skipped");
        return Ok(synthetic_response(StatusCode::OK));
    }

    let query = parse_query(&parts.uri);
    let event = Event {
        page_view: PageView {
            url: url_or_request_uri(&payload.url, &parts.uri),
            ip: client_ip(&parts.headers, peer, state),
            title: payload.title,
            referrer: referrer_or_fallback(&payload.referrer, &parts.headers, &query),
            screen_width: payload.screen_width,
            screen_height: payload.screen_height,
            ..PageView::from_headers(&parts.headers)
        },
        name: payload.event_name,
        duration_seconds: payload.event_duration,
        metadata: payload.event_meta,
    };

    fan_out(state, endpoints::EVENT, &event, AnalyticsClient::event).await?;
    Ok(synthetic_response(StatusCode::OK))
}

pub(super) async fn session<B>(
    req: Request<B>,
    peer: SocketAddr,
    state: &AppState,
) -> HttpResult<Response<RespBody>> {
    let headers = req.headers();
    if is_do_not_track(headers) {
        debug!(?peer, "do not track, session skipped");
        return Ok(synthetic_response(StatusCode::OK));
    }

    let query = parse_query(req.uri());
    let page_view = PageView {
        url: url_or_request_uri(query_value(&query, "url"), req.uri()),
        ip: client_ip(headers, peer, state),
        ..PageView::from_headers(headers)
    };

    fan_out(state, endpoints::SESSION, &page_view, AnalyticsClient::session).await?;
    Ok(synthetic_response(StatusCode::OK))
}

pub(super) async fn script(state: &AppState) -> HttpResult<Response<RespBody>> {
    let body = state
        .scripts
        .get()
        .await
        .map_err(|_| HttpError::ScriptUnavailable)?;

    let mut resp = Response::new(full_body(body));
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/javascript"),
    );
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("1920"), 1920);
        assert_eq!(parse_dimension("-1"), -1);
        assert_eq!(parse_dimension("40000"), 0);
        assert_eq!(parse_dimension("wide"), 0);
        assert_eq!(parse_dimension(""), 0);
    }

    #[test]
    fn test_query_value_decodes() {
        let uri: Uri = "/p/pv?url=https%3A%2F%2Fexample.com%2F%3Fa%3D1&t=Hello+World&t=second"
            .parse()
            .unwrap_or_default();
        let query = parse_query(&uri);
        assert_eq!(query_value(&query, "url"), "https://example.com/?a=1");
        assert_eq!(query_value(&query, "t"), "Hello World");
        assert_eq!(query_value(&query, "ref"), "");
    }

    #[test]
    fn test_url_falls_back_to_request_uri() {
        let uri = Uri::from_static("/p/s?x=1");
        assert_eq!(url_or_request_uri("", &uri), "/p/s?x=1");
        assert_eq!(url_or_request_uri("https://example.com", &uri), "https://example.com");
    }

    #[test]
    fn test_event_request_defaults_missing_fields() -> Result<(), serde_json::Error> {
        let payload: EventRequest = serde_json::from_str(r#"{"event_name":"signup"}"#)?;
        assert_eq!(payload.event_name, "signup");
        assert_eq!(payload.event_duration, 0);
        assert!(payload.event_meta.is_empty());
        Ok(())
    }
}
