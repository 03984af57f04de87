//! All GROQ queries we send to the CMS.
//!
//! Queries project documents into exactly the shapes in `crate::model`:
//! slugs are flattened (`slug.current`), references are dereferenced and
//! links are resolved to paths. Parameters (`$locale`, `$slug`, ...) are
//! passed separately, never interpolated.

use once_cell::sync::Lazy;


const PERSON: &str = "{ name, role, bio, image, url }";

const FORM: &str = "{
    _id, title, submitLabel, successMessage, consent,
    fields[]{ name, label, kind, required, placeholder }
}";

/// Internal links point to a page document and are turned into a localized
/// path.
const LINK: &str = r#"{
    label,
    style,
    "href": coalesce(url, "/" + internal->language + "/" + internal->slug.current)
}"#;

fn module_fields(nested: &str) -> String {
    [
        "...",
        r#"_type == "hero" => { "links": links[]"#, LINK, " }",
        r#"_type == "features" => { "items": items[]{ ..., "link": link"#, LINK, " } }",
        r#"_type == "team" => { "people": people[]->"#, PERSON, " }",
        r#"_type == "pricing-list" => { "plans": plans[]{ ..., "link": link"#, LINK, " } }",
        r#"_type == "quote" => { "author": author->"#, PERSON, " }",
        r#"_type == "form-module" => { "form": form->"#, FORM, " }",
        r#"_type == "component-gallery" => { "modules": modules[]{ "#, nested, " } }",
    ].join("\n")
}

/// Projection of a page module. Modules inside a component gallery are
/// projected the same way, but cannot contain galleries themselves.
static MODULE: Lazy<String> = Lazy::new(|| module_fields("..."));

static PAGE_FIELDS: Lazy<String> = Lazy::new(|| format!(r#"
    _id,
    _updatedAt,
    title,
    "slug": slug.current,
    language,
    seo,
    sidebar,
    "modules": modules[]{{ {module} }},
    "translations": *[_type == "translation.metadata" && references(^._id)][0]
        .translations[]{{ "locale": _key, "slug": value->slug.current }}
"#, module = module_fields(&MODULE)));

pub(crate) static PAGE: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == "page" && language == $locale && slug.current == $slug][0]{{ {} }}"#,
    *PAGE_FIELDS,
));

/// Every page with at least one frontpage module, newest first. The module
/// types are matched by suffix so that new collections don't require a
/// query change.
pub(crate) const FRONTPAGE_CANDIDATES: &str = r#"
    *[_type == "page" && count(modules[_type match "*-frontpage"]) > 0]
    | order(_updatedAt desc)
    {
        "slug": slug.current,
        language,
        _updatedAt,
        "moduleTypes": modules[_type match "*-frontpage"]._type
    }
"#;

const ITEM_FIELDS: &str = r#"
    _id,
    _updatedAt,
    title,
    "slug": slug.current,
    language,
    publishedAt,
    excerpt,
    body,
    image,
    version,
    "authors": authors[]->{ name, role, bio, image, url }
"#;

pub(crate) static COLLECTION_ITEMS: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == $docType && language == $locale && defined(slug.current)]
        | order(coalesce(publishedAt, _updatedAt) desc)
        [0...$limit]
        {{ {ITEM_FIELDS} }}"#,
));

pub(crate) static COLLECTION_ITEM: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == $docType && language == $locale && slug.current == $slug][0]{{ {ITEM_FIELDS} }}"#,
));

static EVENT_FIELDS: Lazy<String> = Lazy::new(|| format!(r#"
    _id,
    _updatedAt,
    title,
    "slug": slug.current,
    language,
    startDateTime,
    duration,
    timezone,
    eventType,
    location,
    onlineUrl,
    summary,
    description,
    image,
    "speakers": speakers[]->{PERSON},
    "registrationForm": registrationForm->{FORM}
"#));

pub(crate) static EVENTS: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == "collection.events" && language == $locale && defined(startDateTime)]
        | order(startDateTime asc)
        {{ {} }}"#,
    *EVENT_FIELDS,
));

pub(crate) static EVENT: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == "collection.events" && language == $locale && slug.current == $slug][0]{{ {} }}"#,
    *EVENT_FIELDS,
));

pub(crate) const LOGOS: &str = r#"*[_type == "logo"] | order(name asc) [0...$limit] { name, image, url }"#;

pub(crate) const FRONTPAGE_TITLE: &str = r#"
    *[_type == "page" && language == $locale && $moduleType in modules[]._type]
    | order(_updatedAt desc)
    [0].title
"#;

pub(crate) const SITEMAP_ENTRIES: &str = r#"
    *[
        (_type == "page" || _type match "collection.*")
        && language == $locale
        && defined(slug.current)
    ] {
        "slug": slug.current,
        "collection": select(
            _type == "collection.article" => "article",
            _type == "collection.documentation" => "documentation",
            _type == "collection.changelog" => "changelog",
            _type == "collection.newsletter" => "newsletter",
            _type == "collection.events" => "events",
        ),
        _updatedAt,
        "noIndex": coalesce(seo.noIndex, false)
    }
"#;

pub(crate) static REGISTRATION_FORM: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == "registrationForm" && _id == $id][0]{FORM}"#,
));

pub(crate) static EVENT_REGISTRATION: Lazy<String> = Lazy::new(|| format!(
    r#"*[_type == "collection.events" && _id == $id][0]{{
        "registrationForm": registrationForm->{FORM}
    }}"#,
));

/// Cheap query used to check connectivity.
pub(crate) const PING: &str = r#"count(*[_type == "page"])"#;


#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(q: &str) -> bool {
        let mut depth = [0i32; 3];
        for c in q.chars() {
            match c {
                '{' => depth[0] += 1,
                '}' => depth[0] -= 1,
                '[' => depth[1] += 1,
                ']' => depth[1] -= 1,
                '(' => depth[2] += 1,
                ')' => depth[2] -= 1,
                _ => {}
            }
            if depth.iter().any(|d| *d < 0) {
                return false;
            }
        }
        depth == [0, 0, 0]
    }

    #[test]
    fn queries_are_balanced() {
        let all: [&str; 13] = [
            &PAGE, FRONTPAGE_CANDIDATES, &COLLECTION_ITEMS, &COLLECTION_ITEM, &EVENTS, &EVENT,
            LOGOS, FRONTPAGE_TITLE, SITEMAP_ENTRIES, &REGISTRATION_FORM, &EVENT_REGISTRATION,
            PING, &MODULE,
        ];
        for q in all {
            assert!(balanced(q), "unbalanced query: {q}");
        }
    }

    #[test]
    fn gallery_modules_are_projected() {
        assert!(PAGE.contains(r#""modules": modules[]{ ..."#));
        assert_eq!(PAGE.matches(r#"_type == "component-gallery""#).count(), 2);
    }
}
