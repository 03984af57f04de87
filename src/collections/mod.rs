//! Collections and the registry mapping (locale, collection) pairs to URL slugs.
//!
//! Which slug a collection uses is decided by content authors: whichever page
//! carries the collection's frontpage module defines it. Resolving this on
//! every request would require a CMS roundtrip, so the mapping is generated
//! once (see [`generate`]) and written to a file that is loaded at startup.

use std::{collections::HashMap, fmt, fs, path::{Path, PathBuf}};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{locale::{self, Locale}, prelude::*};


pub(crate) mod generate;


#[derive(Debug, confique::Config)]
pub(crate) struct CollectionsConfig {
    /// Path of the generated collection registry file. Written by
    /// `cairn generate-collections`, read by `cairn serve`.
    #[config(default = "collections.generated.json")]
    pub(crate) generated_file: PathBuf,
}


/// The closed set of content collections the website has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CollectionType {
    Article,
    Documentation,
    Changelog,
    Newsletter,
    Events,
}

impl CollectionType {
    pub(crate) const ALL: [CollectionType; 5] = [
        CollectionType::Article,
        CollectionType::Documentation,
        CollectionType::Changelog,
        CollectionType::Newsletter,
        CollectionType::Events,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            CollectionType::Article => "article",
            CollectionType::Documentation => "documentation",
            CollectionType::Changelog => "changelog",
            CollectionType::Newsletter => "newsletter",
            CollectionType::Events => "events",
        }
    }

    /// Slug used when no frontpage for this collection exists in a locale.
    pub(crate) fn default_slug(self) -> &'static str {
        match self {
            CollectionType::Article => "articles",
            CollectionType::Documentation => "docs",
            CollectionType::Changelog => "changelog",
            CollectionType::Newsletter => "newsletter",
            CollectionType::Events => "events",
        }
    }

    /// The `_type` of the page module that marks a page as this collection's
    /// frontpage.
    pub(crate) fn frontpage_module_type(self) -> &'static str {
        match self {
            CollectionType::Article => "articles-frontpage",
            CollectionType::Documentation => "documentation-frontpage",
            CollectionType::Changelog => "changelog-frontpage",
            CollectionType::Newsletter => "newsletter-frontpage",
            CollectionType::Events => "events-frontpage",
        }
    }

    pub(crate) fn from_frontpage_module_type(ty: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.frontpage_module_type() == ty)
    }

    /// The CMS document type of items in this collection.
    pub(crate) fn document_type(self) -> &'static str {
        match self {
            CollectionType::Article => "collection.article",
            CollectionType::Documentation => "collection.documentation",
            CollectionType::Changelog => "collection.changelog",
            CollectionType::Newsletter => "collection.newsletter",
            CollectionType::Events => "collection.events",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Where the data of a registry file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RegistrySource {
    Cms,
    Fallback,
}

/// Format of the generated file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistryFile {
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) source: RegistrySource,
    /// Locale code -> collection -> slug.
    pub(crate) slugs: HashMap<String, HashMap<CollectionType, String>>,
}


/// Immutable lookup table from (locale, collection) to URL slug and back.
/// Created once at startup and passed around by reference.
#[derive(Debug, Clone)]
pub(crate) struct CollectionRegistry {
    slugs: HashMap<(&'static str, CollectionType), String>,
    reverse: HashMap<(&'static str, String), CollectionType>,
}

impl CollectionRegistry {
    /// Creates a registry from explicit entries. Entries of unsupported
    /// locales are ignored. Later entries for the same (locale, collection)
    /// pair replace earlier ones, so callers have to deduplicate beforehand.
    pub(crate) fn new(
        entries: impl IntoIterator<Item = (&'static Locale, CollectionType, String)>,
    ) -> Self {
        let mut slugs = HashMap::new();
        for (locale, collection, slug) in entries {
            slugs.insert((locale.code, collection), slug);
        }

        let reverse = slugs.iter()
            .map(|((locale, collection), slug)| ((*locale, slug.clone()), *collection))
            .collect();

        Self { slugs, reverse }
    }

    /// A registry containing the default slug of every collection for every
    /// supported locale.
    pub(crate) fn defaults() -> Self {
        Self::new(Locale::all().flat_map(|locale| {
            CollectionType::ALL.into_iter()
                .map(move |c| (locale, c, c.default_slug().to_owned()))
        }))
    }

    /// Loads the generated registry file. A missing or malformed file is an
    /// error: the generation step must run before the server starts.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!(
            "failed to read generated collection registry '{}' \
                (did you run `cairn generate-collections`?)",
            path.display(),
        ))?;
        let file: RegistryFile = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;

        if file.source == RegistrySource::Fallback {
            warn!(
                "Collection registry '{}' was generated from static defaults (CMS was \
                    unreachable during generation at {})",
                path.display(),
                file.generated_at,
            );
        }

        Ok(Self::from_file(file))
    }

    pub(crate) fn from_file(file: RegistryFile) -> Self {
        let entries = file.slugs.into_iter()
            .filter_map(|(code, slugs)| match Locale::from_code(&code) {
                Some(locale) => Some((locale, slugs)),
                None => {
                    warn!("Ignoring unsupported locale '{code}' in collection registry");
                    None
                }
            })
            .flat_map(|(locale, slugs)| slugs.into_iter().map(move |(c, s)| (locale, c, s)));

        Self::new(entries)
    }

    pub(crate) fn to_file(&self, source: RegistrySource, generated_at: DateTime<Utc>) -> RegistryFile {
        let mut slugs = <HashMap<String, HashMap<_, _>>>::new();
        for ((locale, collection), slug) in &self.slugs {
            slugs.entry(locale.to_string())
                .or_default()
                .insert(*collection, slug.clone());
        }

        RegistryFile { generated_at, source, slugs }
    }

    /// The slug of `collection` in `locale`, if the registry knows one.
    pub(crate) fn slug(&self, collection: CollectionType, locale: &Locale) -> Option<&str> {
        self.slugs.get(&(locale.code, collection)).map(|s| s.as_str())
    }

    /// Like [`Self::slug`], but falls back to the collection's default slug.
    pub(crate) fn slug_with_fallback(&self, collection: CollectionType, locale: &Locale) -> &str {
        self.slug(collection, locale).unwrap_or(collection.default_slug())
    }

    /// Reverse lookup. With `locale = None`, the slug of any locale matches.
    pub(crate) fn type_from_slug(&self, slug: &str, locale: Option<&Locale>) -> Option<CollectionType> {
        match locale {
            Some(locale) => self.reverse.get(&(locale.code, slug.to_owned())).copied(),
            None => Locale::all()
                .find_map(|l| self.reverse.get(&(l.code, slug.to_owned())).copied()),
        }
    }

    /// The collection whose frontpage is at `slug` in `locale`, matching what
    /// [`Self::frontpage_path`] links to: collections without a registered
    /// slug in `locale` are found by their default slug.
    pub(crate) fn resolve(&self, slug: &str, locale: &Locale) -> Option<CollectionType> {
        self.type_from_slug(slug, Some(locale)).or_else(|| {
            CollectionType::ALL.into_iter()
                .filter(|c| self.slug(*c, locale).is_none())
                .find(|c| c.default_slug() == slug)
        })
    }

    /// Whether `path` (with locale prefix, e.g. `/de/artikel/foo`) points to
    /// a collection frontpage or anything below it.
    pub(crate) fn is_collection_path(&self, path: &str) -> bool {
        static LOCALE_PREFIX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^/([a-z]{2}(?:-[A-Za-z]{2})?)(/.*)?$").expect("invalid regex")
        });

        let Some(captures) = LOCALE_PREFIX.captures(path) else {
            return false;
        };
        let Some(locale) = Locale::from_code(&captures[1]) else {
            return false;
        };
        let rest = captures.get(2).map_or("", |m| m.as_str());

        CollectionType::ALL.into_iter()
            .filter_map(|c| self.slug(c, locale))
            .any(|slug| {
                rest.strip_prefix('/')
                    .and_then(|r| r.strip_prefix(slug))
                    .is_some_and(|after| after.is_empty() || after.starts_with('/'))
            })
    }

    /// Path of the collection frontpage, e.g. `/de/veranstaltungen`.
    pub(crate) fn frontpage_path(&self, collection: CollectionType, locale: &Locale) -> String {
        locale::localized_path(locale, self.slug_with_fallback(collection, locale))
    }

    /// Path of a single collection item.
    pub(crate) fn item_path(&self, collection: CollectionType, locale: &Locale, slug: &str) -> String {
        format!("{}/{slug}", self.frontpage_path(collection, locale))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn loc(code: &str) -> &'static Locale {
        Locale::from_code(code).unwrap()
    }

    fn sample() -> CollectionRegistry {
        CollectionRegistry::new([
            (loc("en"), CollectionType::Article, "blog".to_owned()),
            (loc("de"), CollectionType::Article, "artikel".to_owned()),
            (loc("de"), CollectionType::Events, "veranstaltungen".to_owned()),
        ])
    }

    #[test]
    fn lookup() {
        let reg = sample();
        assert_eq!(reg.slug(CollectionType::Article, loc("de")), Some("artikel"));
        assert_eq!(reg.slug(CollectionType::Events, loc("en")), None);
    }

    #[test]
    fn fallback_is_never_absent() {
        for reg in [sample(), CollectionRegistry::defaults(), CollectionRegistry::new([])] {
            for locale in Locale::all() {
                for c in CollectionType::ALL {
                    assert!(!reg.slug_with_fallback(c, locale).is_empty());
                }
            }
        }

        assert_eq!(sample().slug_with_fallback(CollectionType::Events, loc("en")), "events");
        assert_eq!(sample().slug_with_fallback(CollectionType::Events, loc("de")), "veranstaltungen");
    }

    #[test]
    fn reverse_lookup() {
        let reg = sample();
        assert_eq!(reg.type_from_slug("artikel", Some(loc("de"))), Some(CollectionType::Article));
        assert_eq!(reg.type_from_slug("artikel", Some(loc("en"))), None);
        assert_eq!(reg.type_from_slug("artikel", None), Some(CollectionType::Article));
        assert_eq!(reg.type_from_slug("nope", None), None);
    }

    #[test]
    fn resolve_matches_frontpage_links() {
        let reg = sample();
        assert_eq!(reg.resolve("blog", loc("en")), Some(CollectionType::Article));
        assert_eq!(reg.resolve("events", loc("en")), Some(CollectionType::Events));
        // German events have their own slug, so the default one is not a frontpage.
        assert_eq!(reg.resolve("events", loc("de")), None);
        assert_eq!(reg.resolve("articles", loc("en")), None);
        assert_eq!(reg.resolve("docs", loc("de")), Some(CollectionType::Documentation));
    }

    #[test]
    fn collection_paths() {
        let reg = sample();
        assert!(reg.is_collection_path("/de/artikel"));
        assert!(reg.is_collection_path("/de/artikel/"));
        assert!(reg.is_collection_path("/de/artikel/hallo-welt"));
        assert!(reg.is_collection_path("/en/blog/rss.xml"));
        assert!(!reg.is_collection_path("/en/artikel"));
        assert!(!reg.is_collection_path("/de/artikelserie"));
        assert!(!reg.is_collection_path("/xx/blog"));
        assert!(!reg.is_collection_path("/blog"));
        assert!(!reg.is_collection_path("/de"));
    }

    #[test]
    fn defaults_cover_every_locale() {
        let reg = CollectionRegistry::defaults();
        for locale in Locale::all() {
            for c in CollectionType::ALL {
                assert_eq!(reg.slug(c, locale), Some(c.default_slug()));
            }
        }
    }

    #[test]
    fn file_roundtrip_keeps_lookups() {
        let file = sample().to_file(RegistrySource::Cms, Utc::now());
        let json = serde_json::to_string(&file).unwrap();
        let reg = CollectionRegistry::from_file(serde_json::from_str(&json).unwrap());
        assert_eq!(reg.slug(CollectionType::Events, loc("de")), Some("veranstaltungen"));
        assert_eq!(reg.slug(CollectionType::Article, loc("en")), Some("blog"));
    }

    #[test]
    fn frontpage_modules_map_back() {
        for c in CollectionType::ALL {
            assert_eq!(CollectionType::from_frontpage_module_type(c.frontpage_module_type()), Some(c));
        }
    }
}
