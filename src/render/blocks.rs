//! Renderers for the modules that only display their own content.

use maud::{html, Markup};

use crate::model::{
    Callout, CodeModule, ComponentGallery, Faq, Features, Hero, ImageModule, ImageRef, ImageUrls,
    Link, Person, PricingList, Quote, RichText, Stats, Team, Video,
};
use super::{portable_text, render_gallery_module, RenderContext};


pub(super) fn image(image: &ImageRef, width: u32, ctx: &RenderContext<'_>) -> Markup {
    let Some(src) = ctx.images.url(image, Some(width)) else {
        return html! {};
    };
    let srcset = ctx.images.url(image, Some(width * 2))
        .map(|hi| format!("{src} 1x, {hi} 2x"));
    let (w, h) = match ImageUrls::dimensions(image) {
        Some((w, h)) if w > width => (width, (h as u64 * width as u64 / w as u64) as u32),
        Some(dims) => dims,
        None => (width, width),
    };

    html! {
        img src=(src) srcset=[srcset] width=(w) height=(h) loading="lazy" decoding="async"
            alt=(image.alt.as_deref().unwrap_or(""));
    }
}

pub(super) fn link(link: &Link) -> Markup {
    match &link.href {
        Some(href) => html! { a.(link.style.class()) href=(href) { (link.label) } },
        None => html! {},
    }
}

fn heading(title: Option<&str>) -> Markup {
    html! {
        @if let Some(title) = title {
            h2.module-title { (title) }
        }
    }
}

pub(super) fn hero(m: &Hero, ctx: &RenderContext<'_>) -> Markup {
    html! {
        div.hero.with-image[m.image.is_some()] {
            div.hero-text {
                h1 { (m.title) }
                @if let Some(subtitle) = &m.subtitle {
                    p.lead { (subtitle) }
                }
                (portable_text::render(&m.body, ctx))
                @if !m.links.is_empty() {
                    div.actions { @for l in &m.links { (link(l)) } }
                }
            }
            @if let Some(img) = &m.image {
                div.hero-image { (image(img, if ctx.sidebar { 640 } else { 960 }, ctx)) }
            }
        }
    }
}

pub(super) fn rich_text(m: &RichText, ctx: &RenderContext<'_>) -> Markup {
    html! {
        div.prose { (portable_text::render(&m.content, ctx)) }
    }
}

pub(super) fn callout(m: &Callout, ctx: &RenderContext<'_>) -> Markup {
    html! {
        aside.callout data-tone=(m.tone.as_str()) role="note" {
            @if let Some(title) = &m.title {
                p.callout-title { strong { (title) } }
            }
            (portable_text::render(&m.content, ctx))
        }
    }
}

pub(super) fn features(m: &Features, ctx: &RenderContext<'_>) -> Markup {
    html! {
        (heading(m.title.as_deref()))
        @if let Some(intro) = &m.intro {
            p.intro { (intro) }
        }
        ul.feature-grid.narrow[ctx.sidebar] {
            @for f in &m.items {
                li.feature {
                    @if let Some(img) = &f.image { (image(img, 96, ctx)) }
                    h3 { (f.title) }
                    @if let Some(desc) = &f.description { p { (desc) } }
                    @if let Some(l) = &f.link { (link(l)) }
                }
            }
        }
    }
}

fn person(p: &Person, ctx: &RenderContext<'_>) -> Markup {
    html! {
        div.person {
            @if let Some(img) = &p.image { (image(img, 160, ctx)) }
            div {
                @match &p.url {
                    Some(url) => strong { a href=(url) { (p.name) } },
                    None => strong { (p.name) },
                }
                @if let Some(role) = &p.role { br; span.role { (role) } }
                @if let Some(bio) = &p.bio { p.bio { (bio) } }
            }
        }
    }
}

pub(crate) fn people(people: &[Person], ctx: &RenderContext<'_>) -> Markup {
    html! {
        ul.people {
            @for p in people { li { (person(p, ctx)) } }
        }
    }
}

pub(super) fn team(m: &Team, ctx: &RenderContext<'_>) -> Markup {
    html! {
        (heading(m.title.as_deref()))
        (people(&m.people, ctx))
    }
}

pub(super) fn pricing_list(m: &PricingList, ctx: &RenderContext<'_>) -> Markup {
    html! {
        (heading(m.title.as_deref()))
        div.pricing {
            @for plan in &m.plans {
                article.plan.highlighted[plan.highlighted] {
                    h3 { (plan.name) }
                    p.price {
                        @match &plan.price {
                            Some(price) => {
                                strong { (price) }
                                @if let Some(period) = &plan.period { " " span.period { (period) } }
                            },
                            None => strong { (ctx.texts().contact_us) },
                        }
                    }
                    @if let Some(desc) = &plan.description { p { (desc) } }
                    @if !plan.features.is_empty() {
                        ul.checklist { @for f in &plan.features { li { (f) } } }
                    }
                    @if let Some(l) = &plan.link { (link(l)) }
                }
            }
        }
    }
}

pub(super) fn faq(m: &Faq, ctx: &RenderContext<'_>) -> Markup {
    html! {
        (heading(m.title.as_deref()))
        div.faq {
            @for item in &m.items {
                details {
                    summary { (item.question) }
                    div.prose { (portable_text::render(&item.answer, ctx)) }
                }
            }
        }
    }
}

pub(super) fn quote(m: &Quote, ctx: &RenderContext<'_>) -> Markup {
    html! {
        figure.quote {
            blockquote { p { (m.text) } }
            @if let Some(author) = &m.author {
                figcaption { (person(author, ctx)) }
            }
        }
    }
}

pub(super) fn image_module(m: &ImageModule, ctx: &RenderContext<'_>) -> Markup {
    let width = match (m.full_width, ctx.sidebar) {
        (true, false) => 1600,
        (_, true) => 720,
        (false, false) => 1100,
    };

    html! {
        figure.image.full-width[m.full_width] {
            (image(&m.image, width, ctx))
            @if let Some(caption) = &m.caption { figcaption { (caption) } }
        }
    }
}

/// Where a video URL can be embedded from.
#[derive(Debug, PartialEq, Eq)]
enum VideoEmbed {
    YouTube(String),
    Vimeo(String),
    File,
}

fn video_embed(url: &str) -> Option<VideoEmbed> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.");
    let id = match host {
        "youtube.com" | "m.youtube.com" => parsed.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .map(VideoEmbed::YouTube),
        "youtu.be" => parsed.path_segments()?.next()
            .filter(|s| !s.is_empty())
            .map(|s| VideoEmbed::YouTube(s.to_owned())),
        "vimeo.com" => parsed.path_segments()?.last()
            .filter(|s| s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty())
            .map(|s| VideoEmbed::Vimeo(s.to_owned())),
        _ => [".mp4", ".webm", ".m3u8"].iter()
            .any(|ext| parsed.path().ends_with(ext))
            .then_some(VideoEmbed::File),
    };
    id.filter(|e| match e {
        VideoEmbed::YouTube(id) | VideoEmbed::Vimeo(id) => {
            id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        VideoEmbed::File => true,
    })
}

pub(super) fn video(m: &Video, ctx: &RenderContext<'_>) -> Markup {
    let title = m.title.as_deref().unwrap_or(ctx.title);
    html! {
        figure.video {
            @match video_embed(&m.url) {
                Some(VideoEmbed::YouTube(id)) => iframe
                    src=(format!("https://www.youtube-nocookie.com/embed/{id}"))
                    title=(title)
                    loading="lazy"
                    allow="encrypted-media; picture-in-picture; fullscreen" {},
                Some(VideoEmbed::Vimeo(id)) => iframe
                    src=(format!("https://player.vimeo.com/video/{id}?dnt=1"))
                    title=(title)
                    loading="lazy"
                    allow="fullscreen; picture-in-picture" {},
                Some(VideoEmbed::File) => video controls preload="metadata" src=(m.url) title=(title) {},
                None => a href=(m.url) { (title) },
            }
            @if let Some(caption) = &m.caption { figcaption { (caption) } }
        }
    }
}

pub(super) fn code(m: &CodeModule) -> Markup {
    html! {
        figure.code-block {
            @if let Some(filename) = &m.filename { figcaption { code { (filename) } } }
            pre data-language=[m.language.as_deref()] {
                code { (m.code) }
            }
            button.copy-button type="button" data-copy hidden { "Copy" }
        }
    }
}

pub(super) fn stats(m: &Stats) -> Markup {
    html! {
        (heading(m.title.as_deref()))
        dl.stats {
            @for s in &m.items {
                div { dt { (s.label) } dd { (s.value) } }
            }
        }
    }
}

pub(super) fn component_gallery(m: &ComponentGallery, ctx: &RenderContext<'_>) -> Markup {
    html! {
        (heading(m.title.as_deref()))
        div.gallery {
            @for module in &m.modules {
                div.gallery-item {
                    p.gallery-label { code { (module.type_name()) } }
                    (render_gallery_module(module, ctx))
                }
            }
        }
    }
}
