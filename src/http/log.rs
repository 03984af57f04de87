//! This module contains a bunch of small inline modules to make it possible to
//! easily filter out individual log messages with our filter system, e.g.
//! `filters."cairn::http::log::res" = "off"`.

use hyper::Request;
use crate::prelude::*;

pub mod req {
    use super::*;

    pub fn log<B>(req: &Request<B>) {
        trace!(
            method = ?req.method(),
            path = req.uri().path_and_query().map_or("", |pq| pq.as_str()),
            "Incoming HTTP request",
        );
    }
}

pub mod headers {
    use super::*;

    pub fn log<B>(req: &Request<B>) {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut out = String::new();
            for (name, value) in req.headers() {
                use std::fmt::Write;
                let _ = write!(out, "\n  {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
            }
            trace!("HTTP Headers: {}", out);
        }
    }
}

pub mod res {
    use std::time::Duration;
    use hyper::{Method, StatusCode};
    use super::*;

    pub fn log(method: &Method, path: &str, status: StatusCode, duration: Duration) {
        if status.is_server_error() {
            warn!(%method, path, status = status.as_u16(), ?duration, "Answered HTTP request");
        } else {
            debug!(%method, path, status = status.as_u16(), ?duration, "Answered HTTP request");
        }
    }
}
