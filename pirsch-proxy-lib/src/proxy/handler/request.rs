use http::{Method, Request, Response, StatusCode};
use hyper::body::{Body, Bytes};
use std::error::Error as StdError;
use std::net::SocketAddr;
use tokio::time::Instant;
use tracing::debug;

use super::tracking::{event, page_view, script, session};
use crate::proxy::context::{AppState, Route};
use crate::proxy::cors::Cors;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::{synthetic_response, RespBody};

/// Handle one inbound request: route it, apply CORS and record metrics.
///
/// Never fails; errors become empty-bodied responses with the matching status.
pub async fn handle_request<B>(req: Request<B>, peer: SocketAddr, state: &AppState) -> Response<RespBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let start = Instant::now();
    let method = req.method().clone();
    let route = state.routes.pick(req.uri().path());
    let cors = Cors::from_request(req.headers());

    let result = if method == Method::OPTIONS {
        Ok(synthetic_response(StatusCode::NO_CONTENT))
    } else {
        match tokio::time::timeout(state.handler_timeout, dispatch(route, req, peer, state)).await {
            Ok(result) => result,
            Err(_) => Err(HttpError::Timeout),
        }
    };

    let mut resp = result.unwrap_or_else(|e| {
        debug!(?peer, %method, error_type = e.error_type(), error = %e, "request failed");
        synthetic_response(e.into())
    });
    cors.apply(resp.headers_mut());

    if let Some(m) = &state.metrics {
        m.record_request(
            method.as_str(),
            resp.status().as_u16(),
            route.map_or("unmatched", |r| r.as_str()),
            start.elapsed().as_secs_f64(),
        );
    }

    resp
}

async fn dispatch<B>(
    route: Option<Route>,
    req: Request<B>,
    peer: SocketAddr,
    state: &AppState,
) -> HttpResult<Response<RespBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let Some(route) = route else {
        return Err(HttpError::NoMatchingRoute);
    };

    match (route, req.method()) {
        (Route::PageView, &Method::GET) => page_view(req, peer, state).await,
        (Route::Event, &Method::POST) => event(req, peer, state).await,
        (Route::Session, &Method::POST) => session(req, peer, state).await,
        (Route::Script, &Method::GET) => script(state).await,
        _ => Err(HttpError::MethodNotAllowed),
    }
}
