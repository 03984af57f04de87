//! The HTML document around the rendered content: `<head>` metadata,
//! navigation, locale switcher and footer.

use chrono::Datelike;
use maud::{html, Markup, DOCTYPE};

use crate::{
    collections::CollectionType,
    events::{self, EventView},
    locale::{self, Locale},
    model::{CollectionItem, ImageRef, Module, Page, PtNode},
};
use super::{portable_text, render_modules, slugify, RenderContext};


/// Collections linked in the main navigation.
const NAV_COLLECTIONS: [CollectionType; 4] = [
    CollectionType::Article,
    CollectionType::Documentation,
    CollectionType::Changelog,
    CollectionType::Events,
];

/// Metadata of the document that ends up in `<head>`.
struct Head<'a> {
    /// Title without the site name.
    title: Option<&'a str>,
    description: Option<String>,
    image: Option<&'a ImageRef>,
    no_index: bool,
    /// Paths of this document in other locales, including the current one.
    alternates: Vec<(&'static Locale, String)>,
    feed: Option<String>,
}

impl<'a> Head<'a> {
    fn new(title: Option<&'a str>, ctx: &RenderContext<'_>) -> Self {
        Self {
            title,
            description: None,
            image: None,
            no_index: false,
            alternates: vec![(ctx.locale, ctx.path.to_owned())],
            feed: None,
        }
    }
}

/// A CMS page with all its modules.
pub(crate) async fn page(page: &Page, ctx: &RenderContext<'_>) -> Markup {
    let is_home = page.slug == Page::HOME_SLUG;
    let title = page.seo.title.as_deref().unwrap_or(&page.title);

    let mut head = Head::new((!is_home).then_some(title), ctx);
    head.description = page.seo.description.clone();
    head.image = page.seo.image.as_ref();
    head.no_index = page.seo.no_index;
    head.alternates = page.translations.iter()
        .filter_map(|t| Locale::from_code(&t.locale).map(|l| (l, t.slug.as_str())))
        .chain([(ctx.locale, page.slug.as_str())])
        .map(|(l, slug)| match slug {
            Page::HOME_SLUG => (l, locale::localized_path(l, "/")),
            _ => (l, locale::localized_path(l, slug)),
        })
        .collect();
    head.alternates.dedup_by_key(|(l, _)| l.code);
    head.feed = page.modules.iter()
        .find_map(Module::frontpage_of)
        .map(|c| format!("{}/rss.xml", ctx.registry.frontpage_path(c, ctx.locale)));

    let modules = render_modules(&page.modules, ctx).await;
    let body = match page.sidebar {
        false => modules,
        true => html! {
            div.with-sidebar {
                aside.sidebar { (toc(&page.modules, ctx)) }
                div.sidebar-main { (modules) }
            }
        },
    };

    document(head, body, ctx)
}

/// Table of contents built from the second-level headings of all rich text
/// modules. The IDs match the ones `portable_text::render` assigns.
fn toc(modules: &[Module], ctx: &RenderContext<'_>) -> Markup {
    let headings = modules.iter()
        .filter_map(|m| match m {
            Module::RichText(rt) => Some(&rt.content.0),
            _ => None,
        })
        .flatten()
        .filter_map(|node| match node {
            PtNode::Block(b) if matches!(b.style.as_str(), "h1" | "h2") => Some(b.plain_text()),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>();

    html! {
        @if !headings.is_empty() {
            nav.toc aria-label=(ctx.texts().contents) {
                p.toc-title { (ctx.texts().contents) }
                ul {
                    @for h in &headings {
                        li { a href=(format!("#{}", slugify(h))) { (h) } }
                    }
                }
            }
        }
    }
}

/// A single entry of an article-like collection.
pub(crate) fn collection_item(
    collection: CollectionType,
    item: &CollectionItem,
    ctx: &RenderContext<'_>,
) -> Markup {
    let frontpage = ctx.registry.frontpage_path(collection, ctx.locale);
    let mut head = Head::new(Some(&item.title), ctx);
    head.description = Some(item.summary()).filter(|s| !s.is_empty());
    head.image = item.image.as_ref();
    head.feed = Some(format!("{frontpage}/rss.xml"));

    let body = html! {
        article.collection-item data-collection=(collection.as_str()) {
            header {
                p.eyebrow { a href=(frontpage) { (ctx.texts().collection(collection)) } }
                h1 { (item.title) }
                p.meta {
                    time datetime=(item.date().to_rfc3339()) { (ctx.date(&item.date())) }
                    @if let Some(version) = &item.version {
                        " · " span.version { (ctx.texts().version) " " (version) }
                    }
                    @if !item.authors.is_empty() {
                        " · "
                        (item.authors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", "))
                    }
                }
            }
            @if let Some(img) = &item.image {
                figure.item-image { (ctx.image(img, 1100)) }
            }
            div.prose { (portable_text::render(&item.body, ctx)) }
        }
    };

    document(head, body, ctx)
}

/// The page of a single event.
pub(crate) fn event(view: &EventView, ctx: &RenderContext<'_>) -> Markup {
    let mut head = Head::new(Some(&view.event.title), ctx);
    head.description = view.event.summary.clone();
    head.image = view.event.image.as_ref();

    document(head, events::detail(view, ctx), ctx)
}

pub(crate) fn not_found(ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let mut head = Head::new(Some(texts.not_found_title), ctx);
    head.no_index = true;

    document(head, message(texts.not_found_title, texts.not_found_body, ctx), ctx)
}

pub(crate) fn error(ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let mut head = Head::new(Some(texts.error_title), ctx);
    head.no_index = true;

    document(head, message(texts.error_title, texts.error_body, ctx), ctx)
}

fn message(title: &str, body: &str, ctx: &RenderContext<'_>) -> Markup {
    html! {
        div.message-page {
            h1 { (title) }
            p { (body) }
            p { a.button.button-primary href=(locale::localized_path(ctx.locale, "/")) { (ctx.texts().back_home) } }
        }
    }
}


fn document(head: Head<'_>, body: Markup, ctx: &RenderContext<'_>) -> Markup {
    let site_title = ctx.general.site_title.get(ctx.locale);
    let title = match head.title {
        Some(title) => format!("{title} · {site_title}"),
        None => site_title.to_owned(),
    };
    let description = head.description.as_deref()
        .or(ctx.general.site_description.as_ref().map(|d| d.get(ctx.locale)));
    let canonical = ctx.general.site_url.join(ctx.path);
    let image = head.image.and_then(|img| ctx.images.url(img, Some(1200)));
    let x_default = head.alternates.iter().find(|(l, _)| l.is_default());

    html! {
        (DOCTYPE)
        html lang=(ctx.locale.code) dir=(ctx.locale.dir.as_str()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                @if let Some(description) = description {
                    meta name="description" content=(description);
                }
                @if head.no_index {
                    meta name="robots" content="noindex";
                }
                link rel="canonical" href=(canonical);
                @for (l, path) in &head.alternates {
                    link rel="alternate" hreflang=(l.code) href=(ctx.general.site_url.join(path));
                }
                @if let Some((_, path)) = x_default {
                    link rel="alternate" hreflang="x-default" href=(ctx.general.site_url.join(path));
                }
                meta property="og:type" content="website";
                meta property="og:title" content=(title);
                meta property="og:url" content=(canonical);
                meta property="og:site_name" content=(site_title);
                @if let Some(image) = image {
                    meta property="og:image" content=(image);
                }
                @if let Some(feed) = &head.feed {
                    link rel="alternate" type="application/rss+xml" title=(title) href=(feed);
                }
                link rel="stylesheet" href="/~assets/style.css";
                script src="/~assets/site.js" defer {}
            }
            body {
                a.skip-link href="#main" { (ctx.texts().skip_to_content) }
                (header(site_title, &head.alternates, ctx))
                main id="main" { (body) }
                (footer(site_title, ctx))
            }
        }
    }
}

fn header(site_title: &str, alternates: &[(&'static Locale, String)], ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let current = |path: &str| (ctx.path == path || ctx.path.starts_with(&format!("{path}/")))
        .then_some("page");

    html! {
        header.site-header {
            a.site-title href=(locale::localized_path(ctx.locale, "/")) { (site_title) }
            nav.main-nav {
                ul {
                    @for c in NAV_COLLECTIONS {
                        @let path = ctx.registry.frontpage_path(c, ctx.locale);
                        li { a href=(path) aria-current=[current(&path)] { (texts.collection(c)) } }
                    }
                }
            }
            details.locale-switcher {
                summary aria-label=(texts.languages) { (ctx.locale.native_name) }
                ul {
                    @for l in Locale::all() {
                        @let href = alternates.iter()
                            .find(|(alt, _)| alt == &l)
                            .map(|(_, path)| path.clone())
                            .unwrap_or_else(|| locale::localized_path(l, "/"));
                        li {
                            a href=(href) lang=(l.code) hreflang=(l.code)
                                aria-current=[(l == ctx.locale).then_some("true")]
                            {
                                (l.native_name)
                            }
                        }
                    }
                }
            }
        }
    }
}

fn footer(site_title: &str, ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let articles = ctx.registry.frontpage_path(CollectionType::Article, ctx.locale);

    html! {
        footer.site-footer {
            p { "© " (ctx.now.year()) " " (site_title) }
            p {
                a href=(format!("{articles}/rss.xml")) { (texts.rss_feed) }
                " · "
                a href="/sitemap.xml" { "Sitemap" }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        cms::memory::{from_json, MemorySource},
        render::testing::Fixture,
    };
    use super::*;

    fn sample_page() -> Page {
        from_json(json!({
            "_id": "p1",
            "title": "Pricing",
            "slug": "pricing",
            "language": "en",
            "_updatedAt": "2025-01-01T00:00:00Z",
            "seo": { "description": "What it costs" },
            "sidebar": true,
            "translations": [{ "locale": "de", "slug": "preise" }],
            "modules": [
                { "_type": "richtext", "content": [
                    { "_type": "block", "style": "h2", "children": [{ "text": "Plans" }] },
                    { "_type": "block", "children": [{ "text": "Pick one." }] },
                ] },
            ],
        }))
    }

    #[tokio::test]
    async fn page_shell() {
        let mut fx = Fixture::new(MemorySource::default());
        fx.path = "/en/pricing".into();
        let page = sample_page();
        let out = super::page(&page, &fx.ctx()).await.into_string();

        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains(r#"<html lang="en" dir="ltr">"#));
        assert!(out.contains("<title>Pricing · Acme</title>"));
        assert!(out.contains(r#"<meta name="description" content="What it costs">"#));
        assert!(out.contains(r#"<link rel="canonical" href="https://acme.example/en/pricing">"#));
        assert!(out.contains(r#"hreflang="de" href="https://acme.example/de/preise""#));
        assert!(out.contains(r#"hreflang="x-default" href="https://acme.example/en/pricing""#));
        assert!(out.contains(r##"<a href="#plans">Plans</a>"##));
        assert!(out.contains(r#"<a href="/de/preise" lang="de""#));
        assert!(out.contains(r#"<a href="/nb" lang="nb""#));
    }

    #[tokio::test]
    async fn rtl_locale_sets_direction() {
        let fx = Fixture::new(MemorySource::default());
        let mut ctx = fx.ctx();
        ctx.locale = Locale::from_code("ar").unwrap();
        let out = not_found(&ctx).into_string();
        assert!(out.contains(r#"<html lang="ar" dir="rtl">"#));
        assert!(out.contains(r#"<meta name="robots" content="noindex">"#));
    }

    #[test]
    fn item_links_feed() {
        let mut fx = Fixture::new(MemorySource::default());
        fx.path = "/en/changelog/v2".into();
        let item: CollectionItem = from_json(json!({
            "_id": "c1", "title": "Version 2", "slug": "v2", "language": "en",
            "_updatedAt": "2025-02-01T00:00:00Z", "version": "2.0.0",
            "excerpt": "Big release",
        }));
        let out = collection_item(CollectionType::Changelog, &item, &fx.ctx()).into_string();
        assert!(out.contains(r#"type="application/rss+xml""#));
        assert!(out.contains(r#"href="/en/changelog/rss.xml""#));
        assert!(out.contains("2.0.0"));
        assert!(out.contains(r#"<meta name="description" content="Big release">"#));
    }
}
