//! Renderers of modules that load additional data from the CMS. They are
//! always called through `suspense`.

use maud::{html, Markup};

use crate::{
    collections::CollectionType,
    locale::{self, split_locale},
    model::{CollectionFrontpage, CollectionItem, LatestArticles, LogoCloud},
    prelude::*,
};
use super::RenderContext;


pub(super) async fn logo_cloud(m: &LogoCloud, ctx: &RenderContext<'_>) -> Result<Markup> {
    let logos = ctx.source.logos(m.limit.unwrap_or(24)).await?;

    Ok(html! {
        @if let Some(title) = &m.title { h2.module-title { (title) } }
        ul.logo-cloud {
            @for logo in &logos {
                li {
                    @let img = match &logo.image {
                        Some(img) => ctx.image(img, 240),
                        None => html! { span { (logo.name) } },
                    };
                    @match &logo.url {
                        Some(url) => a href=(url) title=(logo.name) { (img) },
                        None => (img),
                    }
                }
            }
        }
    })
}

pub(super) async fn latest_articles(m: &LatestArticles, ctx: &RenderContext<'_>) -> Result<Markup> {
    let collection = m.collection.unwrap_or(CollectionType::Article);
    let limit = m.limit.unwrap_or(3);

    // Events have their own shape, everything else is a plain item.
    let list = if collection == CollectionType::Events {
        crate::events::upcoming_list(ctx, limit).await?
    } else {
        let items = ctx.source.collection_items(collection, ctx.locale, limit).await?;
        item_cards(collection, &items, ctx)
    };

    Ok(html! {
        @if let Some(title) = &m.title { h2.module-title { (title) } }
        (list)
        p.more {
            a.text-link href=(ctx.registry.frontpage_path(collection, ctx.locale)) {
                (ctx.texts().collection(collection)) " →"
            }
        }
    })
}

/// Home, then the collection frontpage (if the current page is inside a
/// collection), then the current page.
pub(super) async fn breadcrumbs(ctx: &RenderContext<'_>) -> Result<Markup> {
    let (_, rest) = split_locale(ctx.path);
    let segments = rest.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
    let home = locale::localized_path(ctx.locale, "/");

    let collection = match segments.first() {
        Some(first) if ctx.registry.is_collection_path(ctx.path) => {
            ctx.registry.type_from_slug(first, Some(ctx.locale))
        }
        _ => None,
    };
    let collection_crumb = match collection {
        // On the frontpage itself, that crumb is the current page.
        Some(c) if segments.len() > 1 => {
            let title = ctx.source.frontpage_title(c, ctx.locale).await?
                .unwrap_or_else(|| ctx.texts().collection(c).to_owned());
            Some((ctx.registry.frontpage_path(c, ctx.locale), title))
        }
        _ => None,
    };

    Ok(html! {
        nav.breadcrumbs aria-label="Breadcrumb" {
            ol {
                li { a href=(home) { (ctx.texts().home) } }
                @if let Some((href, title)) = &collection_crumb {
                    li { a href=(href) { (title) } }
                }
                @if !segments.is_empty() {
                    li aria-current="page" { (ctx.title) }
                }
            }
        }
    })
}

pub(super) async fn collection_frontpage(
    m: &CollectionFrontpage,
    ctx: &RenderContext<'_>,
) -> Result<Markup> {
    let items = ctx.source
        .collection_items(m.collection, ctx.locale, m.page_size.unwrap_or(30))
        .await?;
    let feed = format!("{}/rss.xml", ctx.registry.frontpage_path(m.collection, ctx.locale));

    Ok(html! {
        header.collection-header {
            @if let Some(title) = &m.title { h2.module-title { (title) } }
            a.feed-link href=(feed) { (ctx.texts().rss_feed) }
        }
        @if let Some(intro) = &m.intro { p.intro { (intro) } }
        @if items.is_empty() {
            p.empty { (ctx.texts().no_entries) }
        } @else {
            (item_cards(m.collection, &items, ctx))
        }
    })
}

pub(super) fn item_cards(collection: CollectionType, items: &[CollectionItem], ctx: &RenderContext<'_>) -> Markup {
    html! {
        ul.cards.narrow[ctx.sidebar] data-collection=(collection.as_str()) {
            @for item in items {
                li.card {
                    @if let Some(img) = &item.image { (ctx.image(img, 480)) }
                    h3 {
                        a href=(ctx.registry.item_path(collection, ctx.locale, &item.slug)) {
                            (item.title)
                        }
                    }
                    p.meta {
                        time datetime=(item.date().to_rfc3339()) { (ctx.date(&item.date())) }
                        @if let Some(version) = &item.version {
                            " · " span.version { (ctx.texts().version) " " (version) }
                        }
                    }
                    p { (item.summary()) }
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        cms::memory::{from_json, MemorySource},
        model::{Module, Page},
        render::{render_modules, testing::Fixture},
    };

    fn item(slug: &str, day: u32) -> serde_json::Value {
        json!({
            "_id": slug, "title": format!("Post {slug}"), "slug": slug, "language": "en",
            "publishedAt": format!("2025-01-{day:02}T10:00:00Z"),
            "_updatedAt": "2025-02-01T10:00:00Z",
        })
    }

    #[tokio::test]
    async fn frontpage_lists_newest_first() {
        let source = MemorySource {
            items: vec![
                (crate::collections::CollectionType::Article, from_json(item("older", 3))),
                (crate::collections::CollectionType::Article, from_json(item("newer", 20))),
            ],
            ..MemorySource::default()
        };
        let fx = Fixture::new(source);
        let modules: Vec<Module> = from_json(json!([{ "_type": "articles-frontpage", "title": "Blog" }]));
        let out = render_modules(&modules, &fx.ctx()).await.into_string();

        assert!(out.contains(r#"href="/en/articles/newer""#));
        assert!(out.find("Post newer").unwrap() < out.find("Post older").unwrap());
        assert!(out.contains(r#"href="/en/articles/rss.xml""#));
    }

    #[tokio::test]
    async fn breadcrumbs_use_frontpage_title() {
        let page: Page = from_json(json!({
            "_id": "p1", "title": "Our blog", "slug": "articles", "language": "en",
            "_updatedAt": "2025-01-01T00:00:00Z",
            "modules": [{ "_type": "articles-frontpage" }],
        }));
        let mut fx = Fixture::new(MemorySource { pages: vec![page], ..MemorySource::default() });
        fx.path = "/en/articles/hello".into();

        let modules: Vec<Module> = from_json(json!([{ "_type": "breadcrumbs" }]));
        let out = render_modules(&modules, &fx.ctx()).await.into_string();
        assert!(out.contains(r#"<a href="/en">Home</a>"#));
        assert!(out.contains(r#"<a href="/en/articles">Our blog</a>"#));
        assert!(out.contains(r#"aria-current="page">Test page"#));

        // Plain pages and other locales' collection slugs get no middle crumb.
        for path in ["/en/about", "/en/artikel/hallo"] {
            fx.path = path.into();
            let out = render_modules(&modules, &fx.ctx()).await.into_string();
            assert_eq!(out.matches("<li").count(), 2, "{path}");
        }
    }
}
