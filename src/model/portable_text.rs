//! Portable Text, the CMS's structured rich text format.
//!
//! Only the subset our editors can produce is modelled: text blocks with
//! styles, lists, decorators and link annotations, plus inline images and
//! code blocks. Anything else is kept as `PtNode::Unknown` and skipped when
//! rendering.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::prelude::*;
use super::ImageRef;


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub(crate) struct PortableText(pub(crate) Vec<PtNode>);

impl PortableText {
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text content of all blocks, separated by blank lines. Used for
    /// feed descriptions and meta tags.
    pub(crate) fn plain_text(&self) -> String {
        self.0.iter()
            .filter_map(|node| match node {
                PtNode::Block(b) => Some(b.plain_text()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Like `plain_text`, but cut at a word boundary after roughly
    /// `max_chars` characters.
    pub(crate) fn excerpt(&self, max_chars: usize) -> String {
        truncate_words(&self.plain_text(), max_chars)
    }
}

pub(crate) fn truncate_words(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_owned();
    }

    let cut: String = s.chars().take(max_chars).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(idx) => &cut[..idx],
        None => &cut,
    };
    format!("{}…", cut.trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation()))
}

#[derive(Debug, Clone)]
pub(crate) enum PtNode {
    Block(Block),
    Image(ImageRef),
    Code { code: String, language: Option<String> },
    Unknown(String),
}

impl<'de> Deserialize<'de> for PtNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let ty = value.get("_type").and_then(Value::as_str).unwrap_or_default().to_owned();

        let out = match ty.as_str() {
            "block" => serde_json::from_value(value).map(PtNode::Block),
            "image" => serde_json::from_value(value).map(PtNode::Image),
            "code" => {
                #[derive(Deserialize)]
                struct Code {
                    #[serde(default)]
                    code: String,
                    language: Option<String>,
                }
                serde_json::from_value::<Code>(value)
                    .map(|c| PtNode::Code { code: c.code, language: c.language })
            }
            _ => return Ok(PtNode::Unknown(ty)),
        };

        // A single broken node must not make the whole document unreadable.
        Ok(out.unwrap_or_else(|e| {
            debug!("Skipping malformed portable text node of type '{ty}': {e}");
            PtNode::Unknown(ty)
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Block {
    #[serde(default = "normal_style")]
    pub(crate) style: String,
    #[serde(default)]
    pub(crate) list_item: Option<ListKind>,
    #[serde(default)]
    pub(crate) level: Option<u8>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) children: Vec<Span>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) mark_defs: Vec<MarkDef>,
}

fn normal_style() -> String {
    "normal".into()
}

impl Block {
    pub(crate) fn plain_text(&self) -> String {
        self.children.iter().map(|s| s.text.as_str()).collect()
    }

    pub(crate) fn mark_def(&self, key: &str) -> Option<&MarkDef> {
        self.mark_defs.iter().find(|d| d.key == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ListKind {
    Bullet,
    Number,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Span {
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) text: String,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) marks: Vec<String>,
}

/// Annotation definitions referenced from span marks by key.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MarkDef {
    #[serde(rename = "_key")]
    pub(crate) key: String,
    #[serde(rename = "_type")]
    pub(crate) ty: String,
    #[serde(default)]
    pub(crate) href: Option<String>,
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn sample() -> PortableText {
        serde_json::from_value(json!([
            {
                "_type": "block",
                "style": "h2",
                "children": [{ "_type": "span", "text": "Hello" }],
            },
            {
                "_type": "block",
                "children": [
                    { "_type": "span", "text": "Read the ", "marks": [] },
                    { "_type": "span", "text": "docs", "marks": ["l1", "strong"] },
                ],
                "markDefs": [{ "_key": "l1", "_type": "link", "href": "https://acme.example" }],
            },
            { "_type": "mux.video", "asset": {} },
            { "_type": "image", "broken": true },
        ])).unwrap()
    }

    #[test]
    fn decodes_known_and_unknown_nodes() {
        let pt = sample();
        assert_eq!(pt.0.len(), 4);
        assert!(matches!(&pt.0[0], PtNode::Block(b) if b.style == "h2"));
        assert!(matches!(&pt.0[1], PtNode::Block(b) if b.style == "normal"));
        assert!(matches!(&pt.0[2], PtNode::Unknown(t) if t == "mux.video"));
        assert!(matches!(&pt.0[3], PtNode::Unknown(t) if t == "image"));

        let PtNode::Block(b) = &pt.0[1] else { unreachable!() };
        assert_eq!(b.mark_def("l1").and_then(|d| d.href.as_deref()), Some("https://acme.example"));
    }

    #[test]
    fn plain_text_and_excerpt() {
        let pt = sample();
        assert_eq!(pt.plain_text(), "Hello\n\nRead the docs");
        assert_eq!(pt.excerpt(100), "Hello\n\nRead the docs");
        assert_eq!(truncate_words("The quick brown fox jumps", 12), "The quick…");
    }
}
