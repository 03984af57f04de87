//! Rendering CMS content to HTML.
//!
//! A page is a list of modules. [`render_modules`] renders all of them
//! concurrently. Modules that have to load additional data (logos, latest
//! articles, events, ...) are wrapped in [`suspense`]: if their data does
//! not arrive in time or cannot be loaded, a skeleton is rendered in their
//! place and the rest of the page is unaffected.

use std::{future::Future, time::Duration};
use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use maud::{html, Markup};

use crate::{
    cms::ContentSource,
    collections::CollectionRegistry,
    config::GeneralConfig,
    locale::Locale,
    model::{ImageUrls, Module, UnknownModule},
    prelude::*,
};


pub(crate) mod blocks;
mod fetching;
pub(crate) mod form;
pub(crate) mod page;
pub(crate) mod portable_text;
mod texts;

pub(crate) use self::texts::Texts;


/// Everything renderers need to know about the current request.
pub(crate) struct RenderContext<'a> {
    pub(crate) locale: &'static Locale,
    /// Path of the current request, including the locale prefix.
    pub(crate) path: &'a str,
    /// Title of the document being rendered (page, item, event).
    pub(crate) title: &'a str,
    pub(crate) params: &'a SearchParams,
    /// Whether the modules are rendered next to a sidebar, i.e. in a narrow
    /// column.
    pub(crate) sidebar: bool,
    pub(crate) registry: &'a CollectionRegistry,
    pub(crate) source: &'a dyn ContentSource,
    pub(crate) images: &'a ImageUrls,
    pub(crate) general: &'a GeneralConfig,
    pub(crate) fetch_timeout: Duration,
    /// Point in time the page is rendered for. Everything time-dependent
    /// (event status, calendar month, ...) uses this instead of the clock.
    pub(crate) now: DateTime<Utc>,
}

impl RenderContext<'_> {
    pub(crate) fn texts(&self) -> &'static Texts {
        Texts::of(self.locale)
    }

    /// Formats a date like "5 March 2025" in the current locale.
    pub(crate) fn date<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        dt.format_localized("%-d %B %Y", self.locale.date_locale).to_string()
    }

    pub(crate) fn image(&self, image: &crate::model::ImageRef, width: u32) -> Markup {
        blocks::image(image, width, self)
    }
}


/// Query parameters of the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SearchParams(Vec<(String, String)>);

impl SearchParams {
    pub(crate) fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self(pairs)
    }

    /// First value of `key`, if present and not empty.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Returns the query string (including `?`, or empty) of these
    /// parameters with `key` set to `value`, or removed if `value` is `None`.
    pub(crate) fn with(&self, key: &str, value: Option<&str>) -> String {
        let mut qs = form_urlencoded::Serializer::new(String::new());
        let mut count = 0;
        for (k, v) in self.0.iter().filter(|(k, _)| k != key) {
            qs.append_pair(k, v);
            count += 1;
        }
        if let Some(value) = value {
            qs.append_pair(key, value);
            count += 1;
        }

        match count {
            0 => String::new(),
            _ => format!("?{}", qs.finish()),
        }
    }
}


/// Renders all modules of a page, in order. Data-fetching modules load
/// concurrently.
pub(crate) async fn render_modules(modules: &[Module], ctx: &RenderContext<'_>) -> Markup {
    let rendered = join_all(modules.iter().map(|m| render_module(m, ctx))).await;

    html! {
        @for (module, markup) in modules.iter().zip(rendered) {
            @if let Module::Unknown(_) = module {
                (markup)
            } @else {
                section.module data-module=(module.type_name())
                    id=[module.key().map(|k| format!("m-{k}"))]
                {
                    (markup)
                }
            }
        }
    }
}

/// Renders a single module.
pub(crate) async fn render_module(module: &Module, ctx: &RenderContext<'_>) -> Markup {
    match module {
        Module::Hero(m) => blocks::hero(m, ctx),
        Module::RichText(m) => blocks::rich_text(m, ctx),
        Module::Callout(m) => blocks::callout(m, ctx),
        Module::Features(m) => blocks::features(m, ctx),
        Module::Team(m) => blocks::team(m, ctx),
        Module::PricingList(m) => blocks::pricing_list(m, ctx),
        Module::Faq(m) => blocks::faq(m, ctx),
        Module::Quote(m) => blocks::quote(m, ctx),
        Module::Image(m) => blocks::image_module(m, ctx),
        Module::Video(m) => blocks::video(m, ctx),
        Module::Code(m) => blocks::code(m),
        Module::Stats(m) => blocks::stats(m),
        Module::Form(m) => form::form_module(m, ctx),
        Module::ComponentGallery(m) => blocks::component_gallery(m, ctx),
        Module::LogoCloud(m) => suspense(module, ctx, fetching::logo_cloud(m, ctx)).await,
        Module::LatestArticles(m) => {
            suspense(module, ctx, fetching::latest_articles(m, ctx)).await
        }
        Module::Breadcrumbs(_) => suspense(module, ctx, fetching::breadcrumbs(ctx)).await,
        Module::CollectionFrontpage(m) => {
            suspense(module, ctx, fetching::collection_frontpage(m, ctx)).await
        }
        Module::EventsFrontpage(m) => {
            suspense(module, ctx, crate::events::frontpage(m, ctx)).await
        }
        Module::Unknown(m) => unknown(m),
    }
}

/// Restricted dispatcher used inside the component gallery. Modules that
/// load data on the server (including the gallery itself) are replaced by a
/// placeholder describing them.
pub(crate) fn render_gallery_module(module: &Module, ctx: &RenderContext<'_>) -> Markup {
    match module {
        Module::Hero(m) => blocks::hero(m, ctx),
        Module::RichText(m) => blocks::rich_text(m, ctx),
        Module::Callout(m) => blocks::callout(m, ctx),
        Module::Features(m) => blocks::features(m, ctx),
        Module::Team(m) => blocks::team(m, ctx),
        Module::PricingList(m) => blocks::pricing_list(m, ctx),
        Module::Faq(m) => blocks::faq(m, ctx),
        Module::Quote(m) => blocks::quote(m, ctx),
        Module::Image(m) => blocks::image_module(m, ctx),
        Module::Video(m) => blocks::video(m, ctx),
        Module::Code(m) => blocks::code(m),
        Module::Stats(m) => blocks::stats(m),
        Module::Form(m) => form::form_module(m, ctx),
        Module::LogoCloud(_)
        | Module::LatestArticles(_)
        | Module::Breadcrumbs(_)
        | Module::ComponentGallery(_)
        | Module::CollectionFrontpage(_)
        | Module::EventsFrontpage(_) => html! {
            div.gallery-placeholder data-module=(module.type_name()) {
                strong { code { (module.type_name()) } }
                p { (ctx.texts().gallery_server_only) }
            }
        },
        Module::Unknown(m) => unknown(m),
    }
}

/// Inert element for modules we cannot render. Only visible in the page
/// source, for diagnosing.
fn unknown(m: &UnknownModule) -> Markup {
    html! {
        div hidden data-unknown-module=(m.type_name) data-error=[m.error.as_deref()] {}
    }
}

/// Awaits `fut`, but renders a skeleton instead if it fails or does not
/// finish within `ctx.fetch_timeout`.
pub(crate) async fn suspense(
    module: &Module,
    ctx: &RenderContext<'_>,
    fut: impl Future<Output = Result<Markup>>,
) -> Markup {
    match tokio::time::timeout(ctx.fetch_timeout, fut).await {
        Ok(Ok(markup)) => markup,
        Ok(Err(e)) => {
            warn!("Failed to load data for '{}' module on '{}': {e:#}", module.type_name(), ctx.path);
            skeleton(module, ctx)
        }
        Err(_) => {
            warn!(
                "Loading data for '{}' module on '{}' took longer than {:?}, rendering skeleton",
                module.type_name(),
                ctx.path,
                ctx.fetch_timeout,
            );
            skeleton(module, ctx)
        }
    }
}

fn skeleton(module: &Module, ctx: &RenderContext<'_>) -> Markup {
    html! {
        div.skeleton aria-busy="true" data-skeleton=(module.type_name()) {
            span.visually-hidden { (ctx.texts().loading) }
            div.skeleton-bar {}
            div.skeleton-bar {}
            div.skeleton-bar.short {}
        }
    }
}

/// Turns a heading into an ID usable as URL fragment.
pub(crate) fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_owned()
}


#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::{
        cms::memory::MemorySource,
        collections::CollectionRegistry,
        config::GeneralConfig,
        locale::Locale,
        model::{ImageUrls, TranslatedString},
    };
    use super::{RenderContext, SearchParams};

    /// Owns everything a `RenderContext` borrows.
    pub(crate) struct Fixture {
        pub(crate) source: MemorySource,
        pub(crate) registry: CollectionRegistry,
        pub(crate) images: ImageUrls,
        pub(crate) general: GeneralConfig,
        pub(crate) params: SearchParams,
        pub(crate) now: DateTime<Utc>,
        pub(crate) fetch_timeout: Duration,
        pub(crate) path: String,
    }

    impl Fixture {
        pub(crate) fn new(source: MemorySource) -> Self {
            let title = TranslatedString::try_from(
                [("default".to_owned(), "Acme".to_owned())].into_iter().collect::<std::collections::HashMap<_, _>>(),
            ).unwrap();

            Self {
                source,
                registry: CollectionRegistry::defaults(),
                images: ImageUrls::new("p1", "production"),
                general: GeneralConfig {
                    site_title: title,
                    site_description: None,
                    site_url: "https://acme.example".parse().unwrap(),
                },
                params: SearchParams::default(),
                now: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
                fetch_timeout: Duration::from_millis(200),
                path: "/en/test".into(),
            }
        }

        pub(crate) fn ctx(&self) -> RenderContext<'_> {
            RenderContext {
                locale: Locale::default_locale(),
                path: &self.path,
                title: "Test page",
                params: &self.params,
                sidebar: false,
                registry: &self.registry,
                source: &self.source,
                images: &self.images,
                general: &self.general,
                fetch_timeout: self.fetch_timeout,
                now: self.now,
            }
        }
    }
}
