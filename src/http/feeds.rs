//! RSS feeds and sitemaps. Both come with a processing instruction pointing
//! to an XSL stylesheet, so that browsers show something readable.

use chrono::{DateTime, Utc};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event},
    Writer,
};

use crate::{
    cms::ContentSource,
    collections::{CollectionRegistry, CollectionType},
    config::GeneralConfig,
    events::fetch_events,
    locale::{self, Locale},
    model::Page,
    prelude::*,
};


pub(crate) const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
pub(crate) const SITEMAP_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Maximum number of items in a feed.
const FEED_LIMIT: u32 = 50;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";


/// Everything the feeds need to know besides the CMS content.
pub(crate) struct FeedContext<'a> {
    pub(crate) source: &'a dyn ContentSource,
    pub(crate) registry: &'a CollectionRegistry,
    pub(crate) general: &'a GeneralConfig,
    pub(crate) now: DateTime<Utc>,
}

struct FeedItem {
    title: String,
    path: String,
    date: DateTime<Utc>,
    description: Option<String>,
}

/// RSS 2.0 feed of the newest entries of `collection` in `locale`.
pub(crate) async fn rss(
    collection: CollectionType,
    locale: &'static Locale,
    ctx: &FeedContext<'_>,
) -> Result<String> {
    let items = match collection {
        CollectionType::Events => {
            let mut events = fetch_events(ctx.source, locale, ctx.now).await?;
            events.reverse();
            events.into_iter()
                .take(FEED_LIMIT as usize)
                .map(|v| FeedItem {
                    path: ctx.registry.item_path(collection, locale, &v.event.slug),
                    title: v.event.title,
                    date: v.event.start_date_time,
                    description: v.event.summary,
                })
                .collect::<Vec<_>>()
        }
        _ => ctx.source.collection_items(collection, locale, FEED_LIMIT).await
            .with_context(|| format!("failed to load {collection} items for feed"))?
            .into_iter()
            .map(|item| FeedItem {
                path: ctx.registry.item_path(collection, locale, &item.slug),
                date: item.date(),
                description: Some(item.summary()).filter(|s| !s.is_empty()),
                title: item.title,
            })
            .collect(),
    };

    let site_title = ctx.general.site_title.get(locale);
    let collection_title = ctx.source.frontpage_title(collection, locale).await?
        .unwrap_or_else(|| crate::render::Texts::of(locale).collection(collection).to_owned());
    let frontpage = ctx.registry.frontpage_path(collection, locale);
    let site_url = &ctx.general.site_url;
    let description = ctx.general.site_description.as_ref()
        .map(|d| d.get(locale))
        .unwrap_or(site_title);
    let last_build = items.iter().map(|i| i.date).max().unwrap_or(ctx.now);

    let mut w = XmlWriter::new("/~assets/rss.xsl")?;
    w.start("rss", &[
        ("version", "2.0"),
        ("xmlns:atom", "http://www.w3.org/2005/Atom"),
    ])?;
    w.start("channel", &[])?;
    w.text_element("title", &format!("{collection_title} · {site_title}"))?;
    w.text_element("link", &site_url.join(&frontpage))?;
    w.text_element("description", description)?;
    w.text_element("language", locale.code)?;
    w.text_element("lastBuildDate", &last_build.to_rfc2822())?;
    w.empty("atom:link", &[
        ("href", &site_url.join(&format!("{frontpage}/rss.xml"))),
        ("rel", "self"),
        ("type", "application/rss+xml"),
    ])?;

    for item in &items {
        let link = site_url.join(&item.path);
        w.start("item", &[])?;
        w.text_element("title", &item.title)?;
        w.text_element("link", &link)?;
        w.start("guid", &[("isPermaLink", "true")])?;
        w.text(&link)?;
        w.end("guid")?;
        w.text_element("pubDate", &item.date.to_rfc2822())?;
        if let Some(description) = &item.description {
            w.text_element("description", description)?;
        }
        w.end("item")?;
    }

    w.end("channel")?;
    w.end("rss")?;
    w.finish()
}

/// Sitemap index pointing to the sitemaps of all locales.
pub(crate) fn sitemap_index(general: &GeneralConfig) -> Result<String> {
    let mut w = XmlWriter::new("/~assets/sitemap.xsl")?;
    w.start("sitemapindex", &[("xmlns", SITEMAP_NS)])?;
    for locale in Locale::all() {
        w.start("sitemap", &[])?;
        w.text_element("loc", &general.site_url.join(&format!("/sitemap-{}.xml", locale.code)))?;
        w.end("sitemap")?;
    }
    w.end("sitemapindex")?;
    w.finish()
}

/// Sitemap of all indexable pages, collection items and events of `locale`.
pub(crate) async fn sitemap(locale: &'static Locale, ctx: &FeedContext<'_>) -> Result<String> {
    let entries = ctx.source.sitemap_entries(locale).await
        .with_context(|| format!("failed to load sitemap entries for '{locale}'"))?;

    let mut w = XmlWriter::new("/~assets/sitemap.xsl")?;
    w.start("urlset", &[("xmlns", SITEMAP_NS)])?;
    for entry in entries.iter().filter(|e| !e.no_index) {
        let path = match (entry.collection, entry.slug.as_str()) {
            (Some(c), slug) => ctx.registry.item_path(c, locale, slug),
            (None, Page::HOME_SLUG) => locale::localized_path(locale, "/"),
            (None, slug) => locale::localized_path(locale, slug),
        };

        w.start("url", &[])?;
        w.text_element("loc", &ctx.general.site_url.join(&path))?;
        w.text_element("lastmod", &entry.updated_at.format("%Y-%m-%d").to_string())?;
        w.end("url")?;
    }
    w.end("urlset")?;
    w.finish()
}

pub(crate) fn robots_txt(general: &GeneralConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /~metrics\n\nSitemap: {}\n",
        general.site_url.join("/sitemap.xml"),
    )
}


/// Thin wrapper around `quick_xml::Writer` writing indented UTF-8 XML.
struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Starts a document with XML declaration and stylesheet instruction.
    fn new(stylesheet: &str) -> Result<Self> {
        let mut inner = Writer::new_with_indent(Vec::new(), b' ', 2);
        inner.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let pi = format!(r#"xml-stylesheet type="text/xsl" href="{stylesheet}""#);
        inner.write_event(Event::PI(BytesPI::new(pi.as_str())))?;
        Ok(Self { inner })
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.inner.write_event(Event::Start(tag))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.inner.write_event(Event::Empty(tag))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        let mut out = String::from_utf8(self.inner.into_inner())
            .context("generated XML is not valid UTF-8")?;
        out.push('\n');
        Ok(out)
    }
}
