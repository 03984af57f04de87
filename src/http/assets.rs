//! Static files served below `/~assets/`. They are compiled into the binary.

use std::collections::HashMap;
use hyper::{header, HeaderMap, StatusCode};
use sha1::{Digest, Sha1};

use crate::prelude::*;
use super::{response, Response};


const FILES: &[(&str, &str)] = &[
    ("style.css", include_str!("../../assets/style.css")),
    ("site.js", include_str!("../../assets/site.js")),
    ("rss.xsl", include_str!("../../assets/rss.xsl")),
    ("sitemap.xsl", include_str!("../../assets/sitemap.xsl")),
];

struct Asset {
    content: &'static str,
    content_type: &'static str,
    /// Quoted, as sent in the `ETag` header.
    etag: String,
}

pub(crate) struct Assets {
    files: HashMap<&'static str, Asset>,
}

impl Assets {
    pub(crate) fn new() -> Self {
        let files = FILES.iter()
            .map(|&(path, content)| {
                let hash = hex::encode(Sha1::digest(content.as_bytes()));
                let asset = Asset {
                    content,
                    content_type: content_type(path),
                    etag: format!("\"{}\"", &hash[..16]),
                };
                (path, asset)
            })
            .collect::<HashMap<_, _>>();
        debug!("Prepared {} assets", files.len());

        Self { files }
    }

    /// Responds with the asset identified by the given path (without the
    /// `/~assets/` prefix), or `None` if there is no such asset. Answers
    /// with 304 if the client already has the current version.
    pub(crate) fn serve(&self, path: &str, request_headers: &HeaderMap) -> Option<Response> {
        let asset = self.files.get(path)?;

        let unchanged = request_headers.get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.split(',').any(|tag| {
                let tag = tag.trim();
                tag == "*" || tag.trim_start_matches("W/") == asset.etag
            }));

        let mut out = match unchanged {
            true => response::new(StatusCode::NOT_MODIFIED, asset.content_type, ""),
            false => response::new(StatusCode::OK, asset.content_type, asset.content),
        };
        response::set_header(&mut out, header::ETAG, &asset.etag);
        response::set_header(&mut out, header::CACHE_CONTROL, "public, max-age=300, must-revalidate");
        Some(out)
    }
}

fn content_type(path: &str) -> &'static str {
    // `mime_guess` knows XSL only as `application/xslt+xml`, which browsers
    // refuse to apply as stylesheet.
    if path.ends_with(".xsl") {
        return "text/xsl; charset=utf-8";
    }

    match mime_guess::from_path(path).first_raw() {
        Some("text/css") => "text/css; charset=utf-8",
        Some("application/javascript") | Some("text/javascript") => {
            "text/javascript; charset=utf-8"
        }
        Some(other) => other,
        None => "application/octet-stream",
    }
}
