use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ImageRef, Module};


/// A page authored in the CMS: an ordered list of modules plus metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) title: String,
    /// Unique per locale. The home page has slug `home`.
    pub(crate) slug: String,
    #[serde(rename = "language")]
    pub(crate) locale: String,
    #[serde(rename = "_updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) modules: Vec<Module>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) seo: Seo,
    /// Renders modules next to a sidebar (table of contents, ...).
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) sidebar: bool,
    /// Slugs of this page's translations, keyed by locale code.
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) translations: Vec<Translation>,
}

impl Page {
    pub(crate) const HOME_SLUG: &'static str = "home";
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Translation {
    pub(crate) locale: String,
    pub(crate) slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Seo {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) image: Option<ImageRef>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) no_index: bool,
}

/// A link as projected by our queries: internal references are already
/// resolved to a path.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Link {
    pub(crate) label: String,
    pub(crate) href: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) style: LinkStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LinkStyle {
    #[default]
    Primary,
    Secondary,
    Text,
}

impl LinkStyle {
    pub(crate) fn class(self) -> &'static str {
        match self {
            LinkStyle::Primary => "button button-primary",
            LinkStyle::Secondary => "button button-secondary",
            LinkStyle::Text => "text-link",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Person {
    pub(crate) name: String,
    pub(crate) role: Option<String>,
    pub(crate) bio: Option<String>,
    pub(crate) image: Option<ImageRef>,
    pub(crate) url: Option<String>,
}

/// A customer/partner logo document, shown by the logo cloud module.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Logo {
    pub(crate) name: String,
    pub(crate) image: Option<ImageRef>,
    pub(crate) url: Option<String>,
}

/// Result row of the query the collection registry is generated from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FrontpageCandidate {
    pub(crate) slug: Option<String>,
    #[serde(rename = "language")]
    pub(crate) locale: Option<String>,
    #[serde(rename = "_updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
    /// `_type`s of the frontpage modules on that page.
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) module_types: Vec<String>,
}
