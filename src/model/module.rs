//! The page modules, i.e. the content blocks a page is built from.
//!
//! Each module is a JSON object whose `_type` field says which of the
//! variants below it is. Decoding a module never fails: unknown types
//! (e.g. ones added to the CMS schema after this binary was built) and
//! malformed instances of known types become [`Module::Unknown`] and are
//! rendered as an inert placeholder.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use crate::{collections::CollectionType, events::EventLayout, prelude::*};
use super::{ImageRef, Link, Person, PortableText, RegistrationForm};


#[derive(Debug, Clone)]
pub(crate) enum Module {
    Hero(Hero),
    RichText(RichText),
    Callout(Callout),
    Features(Features),
    Team(Team),
    PricingList(PricingList),
    Faq(Faq),
    Quote(Quote),
    Image(ImageModule),
    Video(Video),
    Code(CodeModule),
    Stats(Stats),
    Form(FormModule),
    LogoCloud(LogoCloud),
    LatestArticles(LatestArticles),
    Breadcrumbs(Breadcrumbs),
    ComponentGallery(ComponentGallery),
    CollectionFrontpage(CollectionFrontpage),
    EventsFrontpage(EventsFrontpage),
    Unknown(UnknownModule),
}

/// `_type` values of all modules we know, including the frontpages.
pub(crate) const KNOWN_TYPES: &[&str] = &[
    "hero",
    "richtext",
    "callout",
    "features",
    "team",
    "pricing-list",
    "faq",
    "quote",
    "image-module",
    "video",
    "code-module",
    "stats",
    "form-module",
    "logo-cloud",
    "latest-articles",
    "breadcrumbs",
    "component-gallery",
    "articles-frontpage",
    "documentation-frontpage",
    "changelog-frontpage",
    "newsletter-frontpage",
    "events-frontpage",
];

impl Module {
    /// The `_type` string of this module. For unknown modules, that is the
    /// raw value found in the data.
    pub(crate) fn type_name(&self) -> &str {
        match self {
            Module::Hero(_) => "hero",
            Module::RichText(_) => "richtext",
            Module::Callout(_) => "callout",
            Module::Features(_) => "features",
            Module::Team(_) => "team",
            Module::PricingList(_) => "pricing-list",
            Module::Faq(_) => "faq",
            Module::Quote(_) => "quote",
            Module::Image(_) => "image-module",
            Module::Video(_) => "video",
            Module::Code(_) => "code-module",
            Module::Stats(_) => "stats",
            Module::Form(_) => "form-module",
            Module::LogoCloud(_) => "logo-cloud",
            Module::LatestArticles(_) => "latest-articles",
            Module::Breadcrumbs(_) => "breadcrumbs",
            Module::ComponentGallery(_) => "component-gallery",
            Module::CollectionFrontpage(m) => m.collection.frontpage_module_type(),
            Module::EventsFrontpage(_) => CollectionType::Events.frontpage_module_type(),
            Module::Unknown(m) => &m.type_name,
        }
    }

    /// The `_key` assigned by the CMS, unique within the page. Used as
    /// anchor ID.
    pub(crate) fn key(&self) -> Option<&str> {
        match self {
            Module::Unknown(_) => None,
            Module::Hero(m) => m.key.as_deref(),
            Module::RichText(m) => m.key.as_deref(),
            Module::Callout(m) => m.key.as_deref(),
            Module::Features(m) => m.key.as_deref(),
            Module::Team(m) => m.key.as_deref(),
            Module::PricingList(m) => m.key.as_deref(),
            Module::Faq(m) => m.key.as_deref(),
            Module::Quote(m) => m.key.as_deref(),
            Module::Image(m) => m.key.as_deref(),
            Module::Video(m) => m.key.as_deref(),
            Module::Code(m) => m.key.as_deref(),
            Module::Stats(m) => m.key.as_deref(),
            Module::Form(m) => m.key.as_deref(),
            Module::LogoCloud(m) => m.key.as_deref(),
            Module::LatestArticles(m) => m.key.as_deref(),
            Module::Breadcrumbs(m) => m.key.as_deref(),
            Module::ComponentGallery(m) => m.key.as_deref(),
            Module::CollectionFrontpage(m) => m.key.as_deref(),
            Module::EventsFrontpage(m) => m.key.as_deref(),
        }
    }

    /// If this module marks its page as a collection frontpage, returns that
    /// collection.
    pub(crate) fn frontpage_of(&self) -> Option<CollectionType> {
        match self {
            Module::CollectionFrontpage(m) => Some(m.collection),
            Module::EventsFrontpage(_) => Some(CollectionType::Events),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Module {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fn decode<T: DeserializeOwned>(v: Value) -> Result<T, serde_json::Error> {
            serde_json::from_value(v)
        }

        let value = Value::deserialize(deserializer)?;
        let ty = match value.get("_type").and_then(Value::as_str) {
            Some(ty) => ty.to_owned(),
            None => return Ok(Module::Unknown(UnknownModule {
                type_name: String::new(),
                error: Some("missing '_type' field".into()),
            })),
        };

        let out = if let Some(collection) = CollectionType::from_frontpage_module_type(&ty) {
            if collection == CollectionType::Events {
                decode(value).map(Module::EventsFrontpage)
            } else {
                decode::<CollectionFrontpageFields>(value).map(|f| {
                    Module::CollectionFrontpage(CollectionFrontpage {
                        key: f.key,
                        collection,
                        title: f.title,
                        intro: f.intro,
                        page_size: f.page_size,
                    })
                })
            }
        } else {
            match ty.as_str() {
                "hero" => decode(value).map(Module::Hero),
                "richtext" => decode(value).map(Module::RichText),
                "callout" => decode(value).map(Module::Callout),
                "features" => decode(value).map(Module::Features),
                "team" => decode(value).map(Module::Team),
                "pricing-list" => decode(value).map(Module::PricingList),
                "faq" => decode(value).map(Module::Faq),
                "quote" => decode(value).map(Module::Quote),
                "image-module" => decode(value).map(Module::Image),
                "video" => decode(value).map(Module::Video),
                "code-module" => decode(value).map(Module::Code),
                "stats" => decode(value).map(Module::Stats),
                "form-module" => decode(value).map(Module::Form),
                "logo-cloud" => decode(value).map(Module::LogoCloud),
                "latest-articles" => decode(value).map(Module::LatestArticles),
                "breadcrumbs" => decode(value).map(Module::Breadcrumbs),
                "component-gallery" => decode(value).map(Module::ComponentGallery),
                _ => return Ok(Module::Unknown(UnknownModule { type_name: ty, error: None })),
            }
        };

        Ok(out.unwrap_or_else(|e| {
            warn!("Malformed '{ty}' module, rendering placeholder instead: {e}");
            Module::Unknown(UnknownModule { type_name: ty, error: Some(e.to_string()) })
        }))
    }
}

/// A module we cannot render.
#[derive(Debug, Clone)]
pub(crate) struct UnknownModule {
    pub(crate) type_name: String,
    /// Set if the type is known, but the data did not have the expected shape.
    pub(crate) error: Option<String>,
}


#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Hero {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: String,
    pub(crate) subtitle: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) body: PortableText,
    pub(crate) image: Option<ImageRef>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RichText {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) content: PortableText,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Callout {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) tone: CalloutTone,
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) content: PortableText,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CalloutTone {
    #[default]
    Info,
    Success,
    Warning,
}

impl CalloutTone {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            CalloutTone::Info => "info",
            CalloutTone::Success => "success",
            CalloutTone::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Features {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) intro: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) items: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Feature {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) image: Option<ImageRef>,
    pub(crate) link: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Team {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) people: Vec<Person>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PricingList {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) plans: Vec<PricingPlan>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PricingPlan {
    pub(crate) name: String,
    /// Preformatted, e.g. "€49". `None` means "contact us".
    pub(crate) price: Option<String>,
    /// E.g. "per month".
    pub(crate) period: Option<String>,
    pub(crate) description: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) features: Vec<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) highlighted: bool,
    pub(crate) link: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Faq {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) items: Vec<FaqItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FaqItem {
    pub(crate) question: String,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) answer: PortableText,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Quote {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) text: String,
    pub(crate) author: Option<Person>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageModule {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) image: ImageRef,
    pub(crate) caption: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) full_width: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Video {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    /// YouTube/Vimeo page URL or direct link to a video file.
    pub(crate) url: String,
    pub(crate) title: Option<String>,
    pub(crate) caption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CodeModule {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) code: String,
    pub(crate) language: Option<String>,
    pub(crate) filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Stats {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) items: Vec<Stat>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Stat {
    pub(crate) value: String,
    pub(crate) label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FormModule {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) intro: Option<String>,
    pub(crate) form: RegistrationForm,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LogoCloud {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LatestArticles {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    /// Which collection to list. Defaults to articles.
    pub(crate) collection: Option<CollectionType>,
    pub(crate) limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Breadcrumbs {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ComponentGallery {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) modules: Vec<Module>,
}

/// Frontpage of one of the article-like collections.
#[derive(Debug, Clone)]
pub(crate) struct CollectionFrontpage {
    pub(crate) key: Option<String>,
    pub(crate) collection: CollectionType,
    pub(crate) title: Option<String>,
    pub(crate) intro: Option<String>,
    pub(crate) page_size: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFrontpageFields {
    #[serde(rename = "_key")]
    key: Option<String>,
    title: Option<String>,
    intro: Option<String>,
    page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsFrontpage {
    #[serde(rename = "_key")]
    pub(crate) key: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) intro: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) default_layout: EventLayout,
    #[serde(default = "yes")]
    pub(crate) show_filters: bool,
}

fn yes() -> bool {
    true
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn module(v: Value) -> Module {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn known_modules() {
        let m = module(json!({ "_type": "hero", "_key": "k1", "title": "Hi" }));
        assert!(matches!(&m, Module::Hero(h) if h.title == "Hi"));
        assert_eq!(m.type_name(), "hero");
        assert_eq!(m.key(), Some("k1"));

        let m = module(json!({ "_type": "changelog-frontpage", "pageSize": 5 }));
        assert!(matches!(&m, Module::CollectionFrontpage(f)
            if f.collection == CollectionType::Changelog && f.page_size == Some(5)));
        assert_eq!(m.type_name(), "changelog-frontpage");
        assert_eq!(m.frontpage_of(), Some(CollectionType::Changelog));

        let m = module(json!({ "_type": "events-frontpage", "defaultLayout": "calendar" }));
        assert!(matches!(&m, Module::EventsFrontpage(f)
            if f.default_layout == EventLayout::Calendar && f.show_filters));
    }

    #[test]
    fn unknown_and_malformed_modules_never_fail() {
        let m = module(json!({ "_type": "carousel-3d", "slides": [] }));
        assert!(matches!(&m, Module::Unknown(u) if u.type_name == "carousel-3d" && u.error.is_none()));
        assert_eq!(m.type_name(), "carousel-3d");

        // Hero without the required title
        let m = module(json!({ "_type": "hero" }));
        assert!(matches!(&m, Module::Unknown(u) if u.type_name == "hero" && u.error.is_some()));

        let m = module(json!({ "title": "no type" }));
        assert!(matches!(m, Module::Unknown(_)));
    }

    #[test]
    fn nested_gallery_modules() {
        let m = module(json!({
            "_type": "component-gallery",
            "modules": [
                { "_type": "stats", "items": [{ "value": "99%", "label": "uptime" }] },
                { "_type": "whatever" },
            ],
        }));
        let Module::ComponentGallery(g) = m else { panic!("not a gallery") };
        assert_eq!(g.modules.len(), 2);
        assert_eq!(g.modules[0].type_name(), "stats");
        assert!(matches!(g.modules[1], Module::Unknown(_)));
    }

    #[test]
    fn known_types_are_consistent() {
        for ty in KNOWN_TYPES {
            let m = module(json!({ "_type": ty }));
            assert_eq!(m.type_name(), *ty);
        }
    }
}
