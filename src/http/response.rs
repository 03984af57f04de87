use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    header::{self, HeaderName, HeaderValue},
    StatusCode,
};
use maud::Markup;
use serde::Serialize;

use crate::prelude::*;
use super::Response;


pub(crate) fn new(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Sets header `name` to `value`. Values that are not valid header values
/// (which only happens with bugs) are logged and skipped.
pub(crate) fn set_header(response: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            response.headers_mut().insert(name, v);
        }
        Err(_) => warn!("Invalid value for '{name}' header: {value:?}"),
    }
}

pub(crate) fn html(status: StatusCode, markup: Markup) -> Response {
    new(status, "text/html; charset=utf-8", markup.into_string())
}

pub(crate) fn xml(content_type: &'static str, body: String) -> Response {
    new(StatusCode::OK, content_type, body)
}

pub(crate) fn json(status: StatusCode, value: &impl Serialize) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => new(status, "application/json", body),
        Err(e) => {
            error!("Failed to serialize JSON response: {e}");
            internal_server_error()
        }
    }
}

pub(crate) fn plain(status: StatusCode, body: &'static str) -> Response {
    new(status, "text/plain; charset=utf-8", body)
}

pub(crate) fn redirect(status: StatusCode, location: &str) -> Response {
    let mut response = new(status, "text/plain; charset=utf-8", Bytes::new());
    set_header(&mut response, header::LOCATION, location);
    response
}

pub(crate) fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND, "404 Not found")
}

pub(crate) fn method_not_allowed() -> Response {
    plain(StatusCode::METHOD_NOT_ALLOWED, "405 Method not allowed")
}

pub(crate) fn service_unavailable() -> Response {
    plain(
        StatusCode::SERVICE_UNAVAILABLE,
        "Server error: service unavailable. Potentially try again later.",
    )
}

pub(crate) fn internal_server_error() -> Response {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
