use maud::{html, Markup};

use crate::model::{Block, ListKind, PortableText, PtNode, Span};
use super::{slugify, RenderContext};


/// Renders portable text. Consecutive list items are grouped into one list.
/// Unknown nodes are skipped.
pub(crate) fn render(pt: &PortableText, ctx: &RenderContext<'_>) -> Markup {
    let mut out = String::new();
    let mut nodes = pt.0.iter().peekable();

    while let Some(node) = nodes.next() {
        let markup = match node {
            PtNode::Block(b) => match b.list_item {
                Some(kind) => {
                    let mut items = vec![b];
                    while let Some(next) = nodes.peek().copied() {
                        let PtNode::Block(next) = next else { break };
                        if next.list_item != Some(kind) {
                            break;
                        }
                        items.push(next);
                        nodes.next();
                    }
                    list(kind, &items)
                }
                None => block(b),
            },
            PtNode::Image(img) => html! {
                figure { (ctx.image(img, if ctx.sidebar { 720 } else { 1100 })) }
            },
            PtNode::Code { code, language } => html! {
                pre data-language=[language.as_deref()] { code { (code) } }
            },
            PtNode::Unknown(_) => continue,
        };
        out.push_str(&markup.into_string());
    }

    maud::PreEscaped(out)
}

fn list(kind: ListKind, items: &[&Block]) -> Markup {
    let items = html! {
        @for item in items { li { (spans(item)) } }
    };
    match kind {
        ListKind::Bullet => html! { ul { (items) } },
        ListKind::Number => html! { ol { (items) } },
    }
}

fn block(b: &Block) -> Markup {
    let id = || slugify(&b.plain_text());
    match b.style.as_str() {
        // The page title is the only `h1`.
        "h1" | "h2" => html! { h2 id=(id()) { (spans(b)) } },
        "h3" => html! { h3 id=(id()) { (spans(b)) } },
        "h4" => html! { h4 { (spans(b)) } },
        "h5" | "h6" => html! { h5 { (spans(b)) } },
        "blockquote" => html! { blockquote { p { (spans(b)) } } },
        _ if b.children.iter().all(|s| s.text.trim().is_empty()) => html! {},
        _ => html! { p { (spans(b)) } },
    }
}

fn spans(b: &Block) -> Markup {
    html! {
        @for span in &b.children { (marked(b, span, &span.marks)) }
    }
}

/// Wraps the text of `span` in one element per mark, the first mark being
/// the outermost.
fn marked(b: &Block, span: &Span, marks: &[String]) -> Markup {
    let Some((mark, rest)) = marks.split_first() else {
        return html! { (span.text) };
    };

    let inner = marked(b, span, rest);
    match mark.as_str() {
        "strong" => html! { strong { (inner) } },
        "em" => html! { em { (inner) } },
        "code" => html! { code { (inner) } },
        "underline" => html! { u { (inner) } },
        "strike-through" => html! { s { (inner) } },
        key => match b.mark_def(key) {
            Some(def) if def.ty == "link" => match &def.href {
                Some(href) if is_safe_href(href) => {
                    let external = href.starts_with("http://") || href.starts_with("https://");
                    html! {
                        a href=(href) rel=[external.then_some("noopener")] { (inner) }
                    }
                }
                _ => inner,
            },
            _ => inner,
        },
    }
}

/// Rejects `javascript:` and similar URLs editors might paste.
fn is_safe_href(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    ["https://", "http://", "mailto:", "tel:", "/", "#"].iter().any(|p| lower.starts_with(p))
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::cms::memory::{from_json, MemorySource};
    use crate::render::testing::Fixture;
    use super::*;

    #[test]
    fn renders_blocks_lists_and_marks() {
        let fx = Fixture::new(MemorySource::default());
        let pt: PortableText = from_json(json!([
            { "_type": "block", "style": "h2", "children": [{ "text": "Getting started" }] },
            { "_type": "block", "listItem": "bullet", "children": [{ "text": "one" }] },
            { "_type": "block", "listItem": "bullet", "children": [{ "text": "two" }] },
            { "_type": "block", "listItem": "number", "children": [{ "text": "first" }] },
            {
                "_type": "block",
                "children": [
                    { "text": "See ", "marks": [] },
                    { "text": "docs", "marks": ["lnk", "strong"] },
                    { "text": " or ", "marks": [] },
                    { "text": "this", "marks": ["bad"] },
                ],
                "markDefs": [
                    { "_key": "lnk", "_type": "link", "href": "https://acme.example/docs" },
                    { "_key": "bad", "_type": "link", "href": "javascript:alert(1)" },
                ],
            },
            { "_type": "table", "rows": [] },
        ]));

        let out = render(&pt, &fx.ctx()).into_string();
        assert_eq!(out.matches("<ul>").count(), 1);
        assert_eq!(out.matches("<ol>").count(), 1);
        assert!(out.contains(r#"<h2 id="getting-started">Getting started</h2>"#));
        assert!(out.contains(
            r#"<a href="https://acme.example/docs" rel="noopener"><strong>docs</strong></a>"#));
        assert!(!out.contains("javascript"));
        assert!(out.contains(" or this"));
    }

    #[test]
    fn escapes_text() {
        let fx = Fixture::new(MemorySource::default());
        let pt: PortableText = from_json(json!([
            { "_type": "block", "children": [{ "text": "<script>x</script>" }] },
        ]));
        let out = render(&pt, &fx.ctx()).into_string();
        assert!(out.contains("&lt;script&gt;"));
    }
}
