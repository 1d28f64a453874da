use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;

pub type RespBody = BoxBody<Bytes, hyper::Error>;

pub fn full_body<T: Into<Bytes>>(chunk: T) -> RespBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> RespBody {
    full_body(Bytes::new())
}

/// Empty-bodied response with the given status, used for 2xx acknowledgements
/// as well as 4xx and 5xx errors
pub(crate) fn synthetic_response(status_code: StatusCode) -> Response<RespBody> {
    let mut res = Response::new(empty_body());
    *res.status_mut() = status_code;
    res
}
