use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{
    body::Body,
    header::{self, HeaderName},
    Method, StatusCode,
};
use std::{sync::Arc, time::Instant};

use crate::{
    collections::CollectionType,
    events::EventView,
    leads::{self, Reply},
    locale::{self, Locale},
    metrics::{HttpReqCategory, LeadOutcome},
    model::Page,
    prelude::*,
    render::{form::SUBMIT_PATH, page, RenderContext, SearchParams},
};
use super::{
    feeds::{self, FeedContext},
    log,
    response,
    Context, Request, Response,
};


const ASSET_PREFIX: &str = "/~assets/";

/// Carries the request path on every response, so that caches and proxies
/// (and our own JS) know which page a response belongs to.
static X_PATHNAME: HeaderName = HeaderName::from_static("x-pathname");


/// This is the main HTTP entry point, called for each incoming request.
pub(super) async fn handle<B>(req: Request<B>, ctx: Arc<Context>) -> Response
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    log::req::log(&req);
    if ctx.config.log.log_http_headers {
        log::headers::log(&req);
    }

    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let (category, mut response) = route(req, &ctx).await;
    ctx.metrics.register_http_req(category);
    response::set_header(&mut response, X_PATHNAME.clone(), &path);

    log::res::log(&method, &path, response.status(), started.elapsed());
    response
}

async fn route<B>(req: Request<B>, ctx: &Context) -> (HttpReqCategory, Response)
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = match req.uri().path() {
        "/" => "/".to_owned(),
        p => p.trim_end_matches('/').to_owned(),
    };

    match path.as_str() {
        // Lead submissions. This is the only path for which POST is allowed.
        SUBMIT_PATH if method == Method::POST => (HttpReqCategory::Lead, handle_lead(req, ctx).await),

        // From this point on, we only support GET and HEAD requests.
        _ if method != Method::GET && method != Method::HEAD => {
            (HttpReqCategory::Other, response::method_not_allowed())
        }

        // Assets (CSS, JS, XSL stylesheets)
        p if p.starts_with(ASSET_PREFIX) => {
            let res = ctx.assets.serve(&p[ASSET_PREFIX.len()..], req.headers())
                .unwrap_or_else(response::not_found);
            (HttpReqCategory::Assets, res)
        }

        "/~metrics" => {
            let body = ctx.metrics.gather_and_encode();
            let res = response::new(
                StatusCode::OK,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
                body,
            );
            (HttpReqCategory::Metrics, res)
        }

        // Other internal routes and the API do not exist in every locale.
        p if p.starts_with("/~") || p == "/api" || p.starts_with("/api/") => {
            (HttpReqCategory::Other, response::not_found())
        }

        "/robots.txt" => {
            let body = feeds::robots_txt(&ctx.config.general);
            (HttpReqCategory::Other, response::new(StatusCode::OK, "text/plain; charset=utf-8", body))
        }

        "/sitemap.xml" => {
            let res = match feeds::sitemap_index(&ctx.config.general) {
                Ok(xml) => response::xml(feeds::SITEMAP_CONTENT_TYPE, xml),
                Err(e) => {
                    error!("Failed to generate sitemap index: {e:#}");
                    response::internal_server_error()
                }
            };
            (HttpReqCategory::Sitemap, res)
        }

        p if sitemap_locale(p).is_some() => (HttpReqCategory::Sitemap, locale_sitemap(p, ctx).await),

        _ => localized(&req, &path, ctx).await,
    }
}

/// The locale code in `/sitemap-{code}.xml`.
fn sitemap_locale(path: &str) -> Option<&str> {
    path.strip_prefix("/sitemap-")?.strip_suffix(".xml")
}

async fn locale_sitemap(path: &str, ctx: &Context) -> Response {
    // Unsupported locales are not an error: crawlers are sent to the index.
    let Some(locale) = sitemap_locale(path).and_then(Locale::from_code) else {
        return response::redirect(StatusCode::FOUND, "/sitemap.xml");
    };

    let feed_ctx = feed_context(ctx);
    match feeds::sitemap(locale, &feed_ctx).await {
        Ok(xml) => response::xml(feeds::SITEMAP_CONTENT_TYPE, xml),
        Err(e) => {
            error!("Failed to generate sitemap for '{locale}': {e:#}");
            response::service_unavailable()
        }
    }
}

fn feed_context(ctx: &Context) -> FeedContext<'_> {
    FeedContext {
        source: &*ctx.source,
        registry: &ctx.registry,
        general: &ctx.config.general,
        now: Utc::now(),
    }
}

/// Whether the last segment of `path` looks like a file name. Those are never
/// redirected to a locale.
fn is_file_path(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

/// Everything below a locale prefix: pages, collection items, events and
/// feeds. Paths without locale prefix are redirected.
async fn localized<B>(req: &Request<B>, path: &str, ctx: &Context) -> (HttpReqCategory, Response) {
    let (locale, rest) = locale::split_locale(path);
    let Some(locale) = locale else {
        if is_file_path(path) {
            return (HttpReqCategory::Other, response::not_found());
        }

        let accept = req.headers().get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        let target = locale::negotiate(accept);
        let mut location = locale::localized_path(target, path);
        if let Some(query) = req.uri().query() {
            location.push('?');
            location.push_str(query);
        }
        trace!("Redirecting '{path}' to '{location}'");
        return (HttpReqCategory::Redirect, response::redirect(StatusCode::TEMPORARY_REDIRECT, &location));
    };

    let params = SearchParams::parse(req.uri().query());
    let pr = PageRequest { ctx, locale, path, params: &params, now: Utc::now() };
    let segments = rest.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();

    match segments.as_slice() {
        [] => (HttpReqCategory::Page, pr.cms_page(Page::HOME_SLUG).await),
        [slug] => (HttpReqCategory::Page, pr.cms_page(slug).await),
        [collection, "rss.xml"] => {
            let res = match ctx.registry.resolve(collection, locale) {
                Some(c) => pr.feed(c).await,
                None => response::not_found(),
            };
            (HttpReqCategory::Feed, res)
        }
        [collection, slug] => match ctx.registry.resolve(collection, locale) {
            Some(CollectionType::Events) => (HttpReqCategory::Item, pr.event(slug).await),
            Some(c) => (HttpReqCategory::Item, pr.item(c, slug).await),
            None => (HttpReqCategory::Other, pr.not_found()),
        },
        _ => (HttpReqCategory::Other, pr.not_found()),
    }
}

/// A request for an HTML document in a specific locale.
struct PageRequest<'a> {
    ctx: &'a Context,
    locale: &'static Locale,
    path: &'a str,
    params: &'a SearchParams,
    now: DateTime<Utc>,
}

impl PageRequest<'_> {
    fn render_ctx<'b>(&'b self, title: &'b str, sidebar: bool) -> RenderContext<'b> {
        RenderContext {
            locale: self.locale,
            path: self.path,
            title,
            params: self.params,
            sidebar,
            registry: &self.ctx.registry,
            source: &*self.ctx.source,
            images: &self.ctx.images,
            general: &self.ctx.config.general,
            fetch_timeout: self.ctx.config.cms.fetch_timeout,
            now: self.now,
        }
    }

    async fn cms_page(&self, slug: &str) -> Response {
        match self.ctx.source.page(self.locale, slug).await {
            Ok(Some(p)) => {
                let ctx = self.render_ctx(&p.title, p.sidebar);
                response::html(StatusCode::OK, page::page(&p, &ctx).await)
            }
            Ok(None) => self.not_found(),
            Err(e) => self.cms_error(e),
        }
    }

    async fn item(&self, collection: CollectionType, slug: &str) -> Response {
        match self.ctx.source.collection_item(collection, self.locale, slug).await {
            Ok(Some(item)) => {
                let ctx = self.render_ctx(&item.title, false);
                response::html(StatusCode::OK, page::collection_item(collection, &item, &ctx))
            }
            Ok(None) => self.not_found(),
            Err(e) => self.cms_error(e),
        }
    }

    async fn event(&self, slug: &str) -> Response {
        match self.ctx.source.event(self.locale, slug).await {
            Ok(Some(event)) => {
                let view = EventView::new(event, self.now);
                let ctx = self.render_ctx(&view.event.title, false);
                response::html(StatusCode::OK, page::event(&view, &ctx))
            }
            Ok(None) => self.not_found(),
            Err(e) => self.cms_error(e),
        }
    }

    async fn feed(&self, collection: CollectionType) -> Response {
        let feed_ctx = FeedContext { now: self.now, ..feed_context(self.ctx) };
        match feeds::rss(collection, self.locale, &feed_ctx).await {
            Ok(xml) => response::xml(feeds::RSS_CONTENT_TYPE, xml),
            Err(e) => {
                error!("Failed to generate {collection} feed for '{}': {e:#}", self.locale);
                response::service_unavailable()
            }
        }
    }

    fn not_found(&self) -> Response {
        debug!("Responding with 404 to '{}'", self.path);
        let texts = crate::render::Texts::of(self.locale);
        let ctx = self.render_ctx(texts.not_found_title, false);
        response::html(StatusCode::NOT_FOUND, page::not_found(&ctx))
    }

    fn cms_error(&self, e: anyhow::Error) -> Response {
        error!("Failed to load content for '{}' from CMS: {e:#}", self.path);
        let texts = crate::render::Texts::of(self.locale);
        let ctx = self.render_ctx(texts.error_title, false);
        response::html(StatusCode::BAD_GATEWAY, page::error(&ctx))
    }
}

/// Handles `POST /api/leads`.
async fn handle_lead<B>(req: Request<B>, ctx: &Context) -> Response
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body: Bytes = match Limited::new(req.into_body(), leads::MAX_BODY_SIZE).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            ctx.metrics.register_lead(LeadOutcome::Invalid);
            let (status, msg) = match e.downcast_ref::<LengthLimitError>() {
                Some(_) => (StatusCode::PAYLOAD_TOO_LARGE, "request body too large"),
                None => (StatusCode::BAD_REQUEST, "could not read request body"),
            };
            return response::json(status, &Reply { success: false, error: Some(msg.into()) });
        }
    };

    match leads::submit(&body, &*ctx.source, Utc::now()).await {
        Ok(_) => {
            ctx.metrics.register_lead(LeadOutcome::Stored);
            response::json(StatusCode::OK, &Reply::ok())
        }
        Err(e) => {
            ctx.metrics.register_lead(e.outcome());
            let status = match e {
                leads::SubmitError::Invalid(_) => StatusCode::BAD_REQUEST,
                leads::SubmitError::Failed(_) => StatusCode::BAD_GATEWAY,
            };
            response::json(status, &e.reply())
        }
    }
}


#[cfg(test)]
mod tests {
    use http_body_util::Full;
    use serde_json::json;

    use crate::{
        cms::memory::{from_json, MemorySource},
        collections::CollectionRegistry,
        config::Config,
    };
    use super::*;

    fn test_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, r#"
            [general]
            site_title.default = "Acme"
            site_url = "https://acme.example"

            [cms]
            project_id = "p1"
        "#).unwrap();
        Config::load_from(&path).unwrap()
    }

    fn context(source: MemorySource) -> Arc<Context> {
        Arc::new(Context::new(test_config(), CollectionRegistry::defaults(), Arc::new(source)))
    }

    fn content() -> MemorySource {
        let page = |slug: &str, lang: &str| from_json(json!({
            "_id": format!("{lang}-{slug}"), "title": format!("Title {slug}"), "slug": slug,
            "language": lang, "_updatedAt": "2025-01-01T00:00:00Z",
            "modules": [{ "_type": "hero", "title": format!("Hero {slug}") }],
        }));
        let item = from_json(json!({
            "_id": "a1", "title": "First post", "slug": "first", "language": "en",
            "publishedAt": "2025-01-10T10:00:00Z", "_updatedAt": "2025-01-10T10:00:00Z",
        }));
        let event = from_json(json!({
            "_id": "e1", "title": "Launch party", "slug": "launch", "language": "en",
            "startDateTime": "2030-01-10T18:00:00Z", "eventType": "physical",
            "_updatedAt": "2025-01-10T10:00:00Z",
        }));

        MemorySource {
            pages: vec![page("home", "en"), page("about", "en"), page("home", "de")],
            items: vec![(CollectionType::Article, item)],
            events: vec![event],
            forms: vec![from_json(json!({
                "_id": "contact", "consent": { "text": "OK?", "required": true },
            }))],
            ..MemorySource::default()
        }
    }

    async fn send(
        ctx: &Arc<Context>,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> (StatusCode, hyper::HeaderMap, String) {
        let mut builder = hyper::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(Full::new(Bytes::from(body.to_owned()))).unwrap();
        let res = handle(req, Arc::clone(ctx)).await;
        let (parts, body) = res.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        (parts.status, parts.headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get(ctx: &Arc<Context>, uri: &str) -> (StatusCode, hyper::HeaderMap, String) {
        send(ctx, Method::GET, uri, &[], "").await
    }

    #[tokio::test]
    async fn redirects_to_negotiated_locale() {
        let ctx = context(content());
        let (status, headers, _) = send(
            &ctx, Method::GET, "/about?x=1", &[("accept-language", "de-CH, en;q=0.5")], "",
        ).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], "/de/about?x=1");
        assert_eq!(headers["x-pathname"], "/about");

        let (status, headers, _) = get(&ctx, "/").await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers[header::LOCATION], "/en");

        // Files are not redirected.
        let (status, _, _) = get(&ctx, "/favicon.ico").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pages_items_and_events() {
        let ctx = context(content());

        let (status, headers, body) = get(&ctx, "/en").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(headers["x-pathname"], "/en");
        assert!(body.contains("Hero home"));

        let (status, _, body) = get(&ctx, "/en/about/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hero about"));

        let (status, _, body) = get(&ctx, "/en/articles/first").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("First post"));

        let (status, _, body) = get(&ctx, "/en/events/launch").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Launch party"));
        assert!(body.contains(r#"data-status="upcoming""#));

        for uri in ["/en/nope", "/de/about", "/en/articles/nope", "/en/unknown/thing", "/en/a/b/c"] {
            let (status, _, body) = get(&ctx, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body.contains("noindex"), "{uri}");
        }
    }

    #[tokio::test]
    async fn cms_failure_renders_error_page() {
        let ctx = context(MemorySource { fail: Some("down"), ..MemorySource::default() });
        let (status, _, body) = get(&ctx, "/en/about").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("<html"));
    }

    #[tokio::test]
    async fn rss_feeds() {
        let ctx = context(content());
        let (status, headers, body) = get(&ctx, "/en/articles/rss.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/rss+xml; charset=utf-8");
        assert!(body.contains(r#"<rss version="2.0""#));
        assert!(body.contains("<language>en</language>"));
        assert!(body.contains("xml-stylesheet"));

        let (status, _, body) = get(&ctx, "/de/events/rss.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<language>de</language>"));

        let (status, _, _) = get(&ctx, "/en/podcasts/rss.xml").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sitemaps_and_robots() {
        let ctx = context(content());
        let (status, headers, body) = get(&ctx, "/sitemap.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().contains("xml"));
        assert!(body.contains("<sitemapindex"));

        let (status, _, body) = get(&ctx, "/sitemap-en.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<loc>https://acme.example/en/about</loc>"));

        let (status, headers, _) = get(&ctx, "/sitemap-xx.xml").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/sitemap.xml");

        let (status, _, body) = get(&ctx, "/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Sitemap: https://acme.example/sitemap.xml"));
    }

    #[tokio::test]
    async fn methods_assets_and_metrics() {
        let ctx = context(content());

        let (status, _, _) = send(&ctx, Method::POST, "/en/about", &[], "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let (status, _, _) = send(&ctx, Method::DELETE, "/api/leads", &[], "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, headers, _) = get(&ctx, "/~assets/site.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key(header::ETAG));
        let (status, _, _) = get(&ctx, "/~assets/nope.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        get(&ctx, "/en").await;
        let (status, _, body) = get(&ctx, "/~metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"cairn_http_requests_total{category="Page"} 1"#), "{body}");
    }

    #[tokio::test]
    async fn lead_submission() {
        let ctx = context(content());
        let post = |body: serde_json::Value| {
            let ctx = Arc::clone(&ctx);
            async move {
                send(&ctx, Method::POST, "/api/leads", &[("content-type", "application/json")],
                    &body.to_string()).await
            }
        };

        let (status, headers, body) = post(json!({
            "email": "ada@example.com",
            "consent": true,
            "source": { "type": "form", "id": "contact" },
            "formId": "contact",
        })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(body, r#"{"success":true}"#);

        let (status, _, body) = post(json!({
            "email": "ada@example.com",
            "source": { "type": "form", "id": "contact" },
            "formId": "contact",
        })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"success":false,"error":"consent is required"}"#);

        let (status, _, _) = send(&ctx, Method::POST, "/api/leads", &[],
            &"x".repeat(leads::MAX_BODY_SIZE + 1)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn lead_storage_failure() {
        let ctx = context(MemorySource { fail: Some("no token"), ..MemorySource::default() });
        let (status, _, body) = send(&ctx, Method::POST, "/api/leads", &[], &json!({
            "email": "ada@example.com",
            "source": { "type": "event", "id": "e1" },
        }).to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.starts_with(r#"{"success":false,"error":"#));
    }
}
