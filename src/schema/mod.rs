//! Declarative definitions of all document and object types editors can
//! create in the CMS.
//!
//! The CMS studio is configured from the JSON export of this registry (see
//! the `export-schema` command). The same definitions are used to check
//! documents with [`validate`].

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::{
    collections::CollectionType,
    events::EventLayout,
    locale::Locale,
    model::{EventType, KNOWN_TYPES},
    prelude::*,
};

mod validate;

pub(crate) use self::validate::validate;


#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypeDef {
    pub(crate) name: &'static str,
    pub(crate) title: &'static str,
    #[serde(rename = "type")]
    pub(crate) kind: TypeKind,
    pub(crate) fields: Vec<FieldDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) preview: Option<Preview>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TypeKind {
    Document,
    Object,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FieldDef {
    pub(crate) name: &'static str,
    pub(crate) title: &'static str,
    #[serde(flatten)]
    pub(crate) ty: FieldType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub(crate) enum FieldType {
    String,
    /// Multi-line plain text.
    Text,
    Number,
    Boolean,
    Datetime,
    Url,
    Slug,
    Image,
    Reference { to: Vec<&'static str> },
    Array { of: Vec<&'static str> },
    Object { of: &'static str },
    PortableText,
    /// A string from a fixed list.
    Select { options: Vec<&'static str> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub(crate) enum Rule {
    Required,
    MinLength { value: usize },
    MaxLength { value: usize },
    Min { value: f64 },
    Max { value: f64 },
    Email,
    Url,
    /// Slug must be unique among documents of the same type and locale.
    /// Only enforced by the studio.
    UniquePerLocale,
}

/// Which fields the studio shows in document lists.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Preview {
    pub(crate) title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) subtitle: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) media: Option<&'static str>,
}

impl FieldDef {
    fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub(crate) fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }
}

impl TypeDef {
    pub(crate) fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}


static REGISTRY: Lazy<Vec<TypeDef>> = Lazy::new(build);

/// All type definitions, documents first.
pub(crate) fn registry() -> &'static [TypeDef] {
    &REGISTRY
}

pub(crate) fn lookup(name: &str) -> Option<&'static TypeDef> {
    registry().iter().find(|t| t.name == name)
}

/// The registry as pretty-printed JSON.
pub(crate) fn export_json() -> Result<String> {
    #[derive(Serialize)]
    struct Export {
        types: &'static [TypeDef],
    }

    serde_json::to_string_pretty(&Export { types: registry() })
        .context("failed to serialize schema")
}


fn field(name: &'static str, title: &'static str, ty: FieldType) -> FieldDef {
    FieldDef { name, title, ty, rules: vec![] }
}

fn string(name: &'static str, title: &'static str) -> FieldDef {
    field(name, title, FieldType::String)
}

fn text(name: &'static str, title: &'static str) -> FieldDef {
    field(name, title, FieldType::Text)
}

fn image(name: &'static str, title: &'static str) -> FieldDef {
    field(name, title, FieldType::Image)
}

fn reference(name: &'static str, title: &'static str, to: &'static str) -> FieldDef {
    field(name, title, FieldType::Reference { to: vec![to] })
}

fn array(name: &'static str, title: &'static str, of: &[&'static str]) -> FieldDef {
    field(name, title, FieldType::Array { of: of.to_vec() })
}

fn object(name: &'static str, title: &'static str, of: &'static str) -> FieldDef {
    field(name, title, FieldType::Object { of })
}

fn select(name: &'static str, title: &'static str, options: Vec<&'static str>) -> FieldDef {
    field(name, title, FieldType::Select { options })
}

fn document(
    name: &'static str,
    title: &'static str,
    fields: Vec<FieldDef>,
    preview: Preview,
) -> TypeDef {
    TypeDef { name, title, kind: TypeKind::Document, fields, preview: Some(preview) }
}

fn obj(name: &'static str, title: &'static str, fields: Vec<FieldDef>) -> TypeDef {
    TypeDef { name, title, kind: TypeKind::Object, fields, preview: None }
}

fn preview(title: &'static str, subtitle: Option<&'static str>, media: Option<&'static str>) -> Preview {
    Preview { title, subtitle, media }
}

fn slug() -> FieldDef {
    field("slug", "Slug", FieldType::Slug).required().rule(Rule::UniquePerLocale)
}

fn language() -> FieldDef {
    select("language", "Language", Locale::all().map(|l| l.code).collect()).required()
}

/// Module types that can be placed inside a component gallery. Galleries
/// and frontpages cannot be nested.
fn gallery_module_types() -> Vec<&'static str> {
    KNOWN_TYPES.iter()
        .copied()
        .filter(|ty| *ty != "component-gallery")
        .filter(|ty| CollectionType::from_frontpage_module_type(ty).is_none())
        .collect()
}

fn build() -> Vec<TypeDef> {
    let mut out = vec![
        document("page", "Page", vec![
            string("title", "Title").required().rule(Rule::MaxLength { value: 120 }),
            slug(),
            language(),
            array("modules", "Modules", KNOWN_TYPES),
            object("seo", "SEO", "seo"),
            field("sidebar", "Show sidebar", FieldType::Boolean),
        ], preview("title", Some("slug.current"), Some("seo.image"))),
    ];

    for collection in CollectionType::ALL {
        let def = match collection {
            CollectionType::Events => events_document(),
            _ => item_document(collection),
        };
        out.push(def);
    }

    out.extend([
        document("registrationForm", "Registration form", vec![
            string("title", "Title"),
            string("submitLabel", "Submit button label"),
            text("successMessage", "Success message"),
            array("fields", "Fields", &["formField"]),
            object("consent", "Consent", "consent"),
        ], preview("title", None, None)),
        document("lead", "Lead", vec![
            string("email", "Email").required().rule(Rule::Email),
            string("name", "Name"),
            string("company", "Company"),
            string("phone", "Phone"),
            text("message", "Message").rule(Rule::MaxLength { value: 5000 }),
            field("consent", "Consent given", FieldType::Boolean),
            object("source", "Source", "leadSource").required(),
            string("formId", "Form ID"),
            // Optional: leads may come from clients that don't send one.
            select("language", "Language", Locale::all().map(|l| l.code).collect()),
            field("submittedAt", "Submitted at", FieldType::Datetime).required(),
        ], preview("email", Some("source.title"), None)),
        document("logo", "Logo", vec![
            string("name", "Name").required(),
            image("image", "Image"),
            field("url", "Website", FieldType::Url).rule(Rule::Url),
        ], preview("name", None, Some("image"))),
        document("person", "Person", vec![
            string("name", "Name").required(),
            string("role", "Role"),
            text("bio", "Biography"),
            image("image", "Photo"),
            field("url", "Website", FieldType::Url).rule(Rule::Url),
        ], preview("name", Some("role"), Some("image"))),
    ]);

    out.extend(module_objects());
    out.extend(helper_objects());
    out
}

fn item_document(collection: CollectionType) -> TypeDef {
    let title = match collection {
        CollectionType::Article => "Article",
        CollectionType::Documentation => "Documentation page",
        CollectionType::Changelog => "Changelog entry",
        CollectionType::Newsletter => "Newsletter issue",
        CollectionType::Events => "Event",
    };

    let mut fields = vec![
        string("title", "Title").required().rule(Rule::MaxLength { value: 160 }),
        slug(),
        language(),
        field("publishedAt", "Published at", FieldType::Datetime),
        text("excerpt", "Excerpt").rule(Rule::MaxLength { value: 300 }),
        field("body", "Body", FieldType::PortableText),
        image("image", "Image"),
        array("authors", "Authors", &["person"]),
    ];
    if collection == CollectionType::Changelog {
        fields.push(string("version", "Version"));
    }

    document(collection.document_type(), title, fields,
        preview("title", Some("publishedAt"), Some("image")))
}

fn events_document() -> TypeDef {
    document(CollectionType::Events.document_type(), "Event", vec![
        string("title", "Title").required().rule(Rule::MaxLength { value: 160 }),
        slug(),
        language(),
        field("startDateTime", "Start", FieldType::Datetime).required(),
        field("duration", "Duration (hours)", FieldType::Number)
            .rule(Rule::Min { value: 0.25 })
            .rule(Rule::Max { value: crate::events::MAX_DURATION_HOURS }),
        string("timezone", "Time zone"),
        select("eventType", "Type", EventType::ALL.map(EventType::as_str).to_vec()).required(),
        object("location", "Location", "location"),
        field("onlineUrl", "Online link", FieldType::Url).rule(Rule::Url),
        text("summary", "Summary").rule(Rule::MaxLength { value: 300 }),
        field("description", "Description", FieldType::PortableText),
        image("image", "Image"),
        array("speakers", "Speakers", &["person"]),
        reference("registrationForm", "Registration form", "registrationForm"),
    ], preview("title", Some("startDateTime"), Some("image")))
}

fn module_objects() -> Vec<TypeDef> {
    let mut out = vec![
        obj("hero", "Hero", vec![
            string("title", "Title").required(),
            string("subtitle", "Subtitle"),
            field("body", "Body", FieldType::PortableText),
            image("image", "Image"),
            array("links", "Links", &["link"]).rule(Rule::MaxLength { value: 3 }),
        ]),
        obj("richtext", "Rich text", vec![
            field("content", "Content", FieldType::PortableText),
        ]),
        obj("callout", "Callout", vec![
            select("tone", "Tone", vec!["info", "success", "warning"]),
            string("title", "Title"),
            field("content", "Content", FieldType::PortableText),
        ]),
        obj("features", "Features", vec![
            string("title", "Title"),
            text("intro", "Introduction"),
            array("items", "Features", &["feature"]),
        ]),
        obj("team", "Team", vec![
            string("title", "Title"),
            array("people", "People", &["person"]),
        ]),
        obj("pricing-list", "Pricing", vec![
            string("title", "Title"),
            array("plans", "Plans", &["pricingPlan"]),
        ]),
        obj("faq", "FAQ", vec![
            string("title", "Title"),
            array("items", "Questions", &["faqItem"]),
        ]),
        obj("quote", "Quote", vec![
            text("text", "Quote").required(),
            reference("author", "Author", "person"),
        ]),
        obj("image-module", "Image", vec![
            image("image", "Image").required(),
            string("caption", "Caption"),
            field("fullWidth", "Full width", FieldType::Boolean),
        ]),
        obj("video", "Video", vec![
            field("url", "Video URL", FieldType::Url).required().rule(Rule::Url),
            string("title", "Title"),
            string("caption", "Caption"),
        ]),
        obj("code-module", "Code", vec![
            text("code", "Code").required(),
            string("language", "Language"),
            string("filename", "File name"),
        ]),
        obj("stats", "Statistics", vec![
            string("title", "Title"),
            array("items", "Numbers", &["stat"]),
        ]),
        obj("form-module", "Form", vec![
            string("title", "Title"),
            text("intro", "Introduction"),
            reference("form", "Form", "registrationForm").required(),
        ]),
        obj("logo-cloud", "Logo cloud", vec![
            string("title", "Title"),
            field("limit", "Maximum number of logos", FieldType::Number)
                .rule(Rule::Min { value: 1.0 }),
        ]),
        obj("latest-articles", "Latest entries", vec![
            string("title", "Title"),
            select("collection", "Collection", CollectionType::ALL.map(CollectionType::as_str).to_vec()),
            field("limit", "Number of entries", FieldType::Number)
                .rule(Rule::Min { value: 1.0 })
                .rule(Rule::Max { value: 24.0 }),
        ]),
        obj("breadcrumbs", "Breadcrumbs", vec![]),
        obj("component-gallery", "Component gallery", vec![
            string("title", "Title"),
            field("modules", "Modules", FieldType::Array { of: gallery_module_types() }),
        ]),
    ];

    for collection in CollectionType::ALL {
        let name = collection.frontpage_module_type();
        let def = match collection {
            CollectionType::Events => obj(name, "Events frontpage", vec![
                string("title", "Title"),
                text("intro", "Introduction"),
                select("defaultLayout", "Default layout",
                    EventLayout::ALL.map(EventLayout::as_str).to_vec()),
                field("showFilters", "Show filters", FieldType::Boolean),
            ]),
            _ => obj(name, "Collection frontpage", vec![
                string("title", "Title"),
                text("intro", "Introduction"),
                field("pageSize", "Entries per page", FieldType::Number)
                    .rule(Rule::Min { value: 1.0 }),
            ]),
        };
        out.push(def);
    }

    out
}

fn helper_objects() -> Vec<TypeDef> {
    vec![
        obj("seo", "SEO", vec![
            string("title", "Title").rule(Rule::MaxLength { value: 70 }),
            text("description", "Description").rule(Rule::MaxLength { value: 160 }),
            image("image", "Social media image"),
            field("noIndex", "Hide from search engines", FieldType::Boolean),
        ]),
        obj("link", "Link", vec![
            string("label", "Label").required(),
            field("href", "Target", FieldType::Url).rule(Rule::Url),
            select("style", "Style", vec!["primary", "secondary", "text"]),
        ]),
        obj("feature", "Feature", vec![
            string("title", "Title").required(),
            text("description", "Description"),
            image("image", "Image"),
            object("link", "Link", "link"),
        ]),
        obj("pricingPlan", "Pricing plan", vec![
            string("name", "Name").required(),
            string("price", "Price"),
            string("period", "Period"),
            text("description", "Description"),
            array("features", "Included features", &["string"]),
            field("highlighted", "Highlighted", FieldType::Boolean),
            object("link", "Link", "link"),
        ]),
        obj("faqItem", "Question", vec![
            string("question", "Question").required(),
            field("answer", "Answer", FieldType::PortableText),
        ]),
        obj("stat", "Number", vec![
            string("value", "Value").required(),
            string("label", "Label").required(),
        ]),
        obj("location", "Location", vec![
            string("name", "Name"),
            string("address", "Address"),
            string("city", "City"),
        ]),
        obj("formField", "Form field", vec![
            string("name", "Name").required(),
            string("label", "Label").required(),
            select("kind", "Kind", vec!["text", "email", "tel", "textarea", "checkbox"]).required(),
            field("required", "Required", FieldType::Boolean),
            string("placeholder", "Placeholder"),
        ]),
        obj("consent", "Consent", vec![
            text("text", "Text").required(),
            field("required", "Required", FieldType::Boolean),
        ]),
        obj("leadSource", "Lead source", vec![
            string("type", "Type").required(),
            string("id", "ID").required(),
            string("title", "Title"),
        ]),
    ]
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use super::*;

    #[test]
    fn every_module_type_is_defined() {
        for ty in KNOWN_TYPES {
            let def = lookup(ty).unwrap_or_else(|| panic!("no schema for module '{ty}'"));
            assert_eq!(def.kind, TypeKind::Object, "{ty}");
        }
    }

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for def in registry() {
            assert!(seen.insert(def.name), "duplicate type '{}'", def.name);
        }
    }

    #[test]
    fn referenced_types_exist() {
        let primitives = ["string"];
        for def in registry() {
            for f in &def.fields {
                let targets = match &f.ty {
                    FieldType::Reference { to } => to.clone(),
                    FieldType::Array { of } => of.clone(),
                    FieldType::Object { of } => vec![*of],
                    _ => continue,
                };
                for t in targets {
                    assert!(
                        primitives.contains(&t) || lookup(t).is_some(),
                        "'{}.{}' refers to unknown type '{t}'", def.name, f.name,
                    );
                }
            }
        }
    }

    #[test]
    fn documents() {
        for name in ["page", "registrationForm", "lead", "logo", "person"] {
            assert_eq!(lookup(name).map(|d| d.kind), Some(TypeKind::Document), "{name}");
        }
        for c in CollectionType::ALL {
            assert!(lookup(c.document_type()).is_some());
        }
        assert!(lookup("collection.changelog").unwrap().field("version").is_some());
        assert!(lookup("collection.article").unwrap().field("version").is_none());
    }

    #[test]
    fn export_shape() {
        let json: serde_json::Value = serde_json::from_str(&export_json().unwrap()).unwrap();
        let types = json["types"].as_array().unwrap();
        let hero = types.iter().find(|t| t["name"] == "hero").unwrap();
        assert_eq!(hero["type"], "object");
        assert_eq!(hero["fields"][0]["name"], "title");
        assert_eq!(hero["fields"][0]["type"], "string");
        assert_eq!(hero["fields"][0]["rules"][0]["rule"], "required");

        let page = types.iter().find(|t| t["name"] == "page").unwrap();
        assert_eq!(page["preview"]["title"], "title");
        let slug = &page["fields"][1];
        assert_eq!(slug["type"], "slug");
        assert_eq!(slug["rules"][1]["rule"], "uniquePerLocale");
    }

    #[test]
    fn galleries_do_not_nest() {
        let gallery = lookup("component-gallery").unwrap();
        let FieldType::Array { of } = &gallery.field("modules").unwrap().ty else {
            panic!("modules is not an array");
        };
        assert!(!of.contains(&"component-gallery"));
        assert!(!of.contains(&"events-frontpage"));
        assert!(of.contains(&"hero"));
    }
}
