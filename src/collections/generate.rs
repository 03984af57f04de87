//! The `generate-collections` command: builds the collection registry from
//! the frontpages in the CMS and writes it to disk.

use std::{collections::HashSet, fs, path::Path, time::Instant};
use chrono::Utc;
use confique::Config as _;
use serde_json::Value;

use crate::{
    cms::{CmsConfig, ContentSource, SanityClient},
    config::Config,
    locale::Locale,
    model::FrontpageCandidate,
    prelude::*,
};
use super::{CollectionRegistry, CollectionType, CollectionsConfig, RegistryFile, RegistrySource};


/// Entry point of the command. `config` is `None` if the configuration file
/// could not be loaded; in that case the CMS settings are read from the
/// environment only.
///
/// Never fails because of the CMS: if anything goes wrong, the fallback
/// registry is written instead. Only an error writing that file is returned.
pub(crate) async fn run(config: Option<&Config>) -> Result<()> {
    let default_path;
    let out = match config {
        Some(config) => &config.collections.generated_file,
        None => {
            default_path = CollectionsConfig::builder().env().load()
                .map(|c| c.generated_file)
                .unwrap_or_else(|_| "collections.generated.json".into());
            &default_path
        }
    };

    let client = match config {
        Some(config) => SanityClient::new(&config.cms),
        None => cms_config_from_env(|var| std::env::var(var).ok())
            .and_then(|cms| SanityClient::new(&cms)),
    };

    match client {
        Ok(client) => generate(&client, out).await.map(|_| ()),
        Err(e) => {
            warn!("Cannot query CMS, writing fallback collection registry: {e:#}");
            write_fallback(out)
        }
    }
}

/// Variables of older frontend builds naming the CMS project. They are used
/// if the corresponding `CAIRN_CMS_*` variable is not set.
const FALLBACK_ENV: &[(&str, &str)] = &[
    ("project_id", "NEXT_PUBLIC_SANITY_PROJECT_ID"),
    ("dataset", "NEXT_PUBLIC_SANITY_DATASET"),
];

/// Loads the CMS configuration from the `CAIRN_CMS_*` variables, filling
/// gaps from [`FALLBACK_ENV`] looked up via `var`.
fn cms_config_from_env(var: impl Fn(&str) -> Option<String>) -> Result<CmsConfig> {
    let fallback = FALLBACK_ENV.iter()
        .filter_map(|&(field, name)| Some((field.to_owned(), Value::from(var(name)?))))
        .collect::<serde_json::Map<_, _>>()
        .pipe(|map| serde_json::from_value::<<CmsConfig as confique::Config>::Layer>(map.into()))
        .context("invalid CMS settings in environment")?;

    CmsConfig::builder()
        .env()
        .preloaded(fallback)
        .load()
        .context("failed to load CMS configuration from environment")
}

/// Queries `source` and writes the registry to `out`. On failure to query
/// or to write the CMS-based registry, the fallback is written. Returns
/// which of the two ended up in the file.
pub(crate) async fn generate(source: &dyn ContentSource, out: &Path) -> Result<RegistrySource> {
    let before = Instant::now();
    let result = source.frontpage_candidates().await
        .map(build_registry)
        .and_then(|registry| {
            let file = registry.to_file(RegistrySource::Cms, Utc::now());
            write_file(out, &file)
        });

    match result {
        Ok(()) => {
            info!(
                "Wrote collection registry from CMS to '{}' (took {:.2?})",
                out.display(),
                before.elapsed(),
            );
            Ok(RegistrySource::Cms)
        }
        Err(e) => {
            warn!("Failed to generate collection registry from CMS, writing fallback: {e:#}");
            write_fallback(out).map(|_| RegistrySource::Fallback)
        }
    }
}

fn write_fallback(out: &Path) -> Result<()> {
    let file = CollectionRegistry::defaults().to_file(RegistrySource::Fallback, Utc::now());
    write_file(out, &file).context("failed to write fallback collection registry")?;
    info!("Wrote fallback collection registry (default slugs only) to '{}'", out.display());
    Ok(())
}

/// Writes atomically so that a running server restarted concurrently never
/// sees a half-written file.
fn write_file(path: &Path, file: &RegistryFile) -> Result<()> {
    let json = serde_json::to_vec_pretty(file)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write '{}'", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move '{}' to '{}'", tmp.display(), path.display()))?;

    Ok(())
}

/// Picks one slug per (locale, collection). The most recently updated page
/// wins, pages after it that claim the same pair are skipped. Pairs without
/// any page get the default slug.
pub(crate) fn build_registry(mut candidates: Vec<FrontpageCandidate>) -> CollectionRegistry {
    // Stable, so equal timestamps keep the CMS order.
    candidates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for candidate in candidates {
        let Some(slug) = candidate.slug.filter(|s| !s.trim().is_empty()) else {
            warn!("Skipping frontpage candidate without slug (locale {:?})", candidate.locale);
            continue;
        };
        let Some(locale) = candidate.locale.as_deref().and_then(Locale::from_code) else {
            warn!(
                "Skipping frontpage '{slug}' with unsupported locale {:?}",
                candidate.locale,
            );
            continue;
        };

        for ty in &candidate.module_types {
            let Some(collection) = CollectionType::from_frontpage_module_type(ty) else {
                debug!("Ignoring unknown frontpage module type '{ty}' on page '{slug}'");
                continue;
            };

            if !seen.insert((locale.code, collection)) {
                info!(
                    "Page '{slug}' ({locale}) is also a {collection} frontpage, but a more \
                        recently updated page already is. Skipping.",
                );
                continue;
            }

            debug!("{collection} frontpage in '{locale}': '{slug}'");
            entries.push((locale, collection, slug.clone()));
        }
    }

    let defaults = Locale::all()
        .flat_map(|l| CollectionType::ALL.into_iter().map(move |c| (l, c)))
        .filter(|(l, c)| !seen.contains(&(l.code, *c)))
        .map(|(l, c)| (l, c, c.default_slug().to_owned()))
        .collect::<Vec<_>>();

    CollectionRegistry::new(entries.into_iter().chain(defaults))
}


#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use crate::{cms::memory::MemorySource, collections::CollectionRegistry};
    use super::*;

    fn candidate(slug: Option<&str>, locale: &str, hour: u32, types: &[&str]) -> FrontpageCandidate {
        FrontpageCandidate {
            slug: slug.map(Into::into),
            locale: Some(locale.into()),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            module_types: types.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn loc(code: &str) -> &'static Locale {
        Locale::from_code(code).unwrap()
    }

    fn read(path: &Path) -> (RegistryFile, CollectionRegistry) {
        let file: RegistryFile = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        let registry = CollectionRegistry::load(path).unwrap();
        (file, registry)
    }

    #[test]
    fn cms_settings_from_frontend_variables() {
        if std::env::vars().any(|(k, _)| k.starts_with("CAIRN_CMS_")) {
            return;
        }

        let cms = cms_config_from_env(|name| match name {
            "NEXT_PUBLIC_SANITY_PROJECT_ID" => Some("p42".into()),
            "NEXT_PUBLIC_SANITY_DATASET" => Some("staging".into()),
            _ => None,
        }).unwrap();
        assert_eq!(cms.project_id, "p42");
        assert_eq!(cms.dataset, "staging");
        assert_eq!(cms.api_version, "2024-08-01");

        let cms = cms_config_from_env(|name| {
            (name == "NEXT_PUBLIC_SANITY_PROJECT_ID").then(|| "p42".to_owned())
        }).unwrap();
        assert_eq!(cms.dataset, "production");

        assert!(cms_config_from_env(|_| None).is_err());
    }

    #[test]
    fn most_recent_page_wins() {
        let registry = build_registry(vec![
            candidate(Some("old-blog"), "en", 8, &["articles-frontpage"]),
            candidate(Some("blog"), "en", 12, &["articles-frontpage"]),
            candidate(Some("veranstaltungen"), "de", 9, &["events-frontpage", "carousel-frontpage"]),
            candidate(None, "de", 23, &["articles-frontpage"]),
            candidate(Some("blogue"), "fr", 23, &["articles-frontpage"]),
        ]);

        assert_eq!(registry.slug(CollectionType::Article, loc("en")), Some("blog"));
        assert_eq!(registry.slug(CollectionType::Events, loc("de")), Some("veranstaltungen"));
        assert_eq!(registry.slug(CollectionType::Article, loc("de")), Some("articles"));
        assert_eq!(registry.slug(CollectionType::Changelog, loc("ar")), Some("changelog"));
        assert_eq!(registry.type_from_slug("old-blog", None), None);
    }

    #[test]
    fn ties_keep_query_order() {
        let registry = build_registry(vec![
            candidate(Some("first"), "en", 10, &["documentation-frontpage"]),
            candidate(Some("second"), "en", 10, &["documentation-frontpage"]),
        ]);
        assert_eq!(registry.slug(CollectionType::Documentation, loc("en")), Some("first"));
    }

    #[tokio::test]
    async fn writes_cms_registry() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen/collections.json");
        let source = MemorySource {
            candidates: vec![candidate(Some("neuigkeiten"), "de", 1, &["newsletter-frontpage"])],
            ..MemorySource::default()
        };

        assert_eq!(generate(&source, &out).await.unwrap(), RegistrySource::Cms);
        let (file, registry) = read(&out);
        assert_eq!(file.source, RegistrySource::Cms);
        assert_eq!(registry.slug(CollectionType::Newsletter, loc("de")), Some("neuigkeiten"));
    }

    #[tokio::test]
    async fn cms_failure_writes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("collections.json");
        let source = MemorySource { fail: Some("connection refused"), ..MemorySource::default() };

        assert_eq!(generate(&source, &out).await.unwrap(), RegistrySource::Fallback);
        let (file, registry) = read(&out);
        assert_eq!(file.source, RegistrySource::Fallback);
        assert_eq!(file.slugs.len(), Locale::all().count());
        for locale in Locale::all() {
            for c in CollectionType::ALL {
                assert_eq!(registry.slug(c, locale), Some(c.default_slug()));
            }
        }
    }

    #[tokio::test]
    async fn unwritable_fallback_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let out = dir.path().join("taken");
        fs::create_dir(&out).unwrap();
        fs::create_dir(out.with_extension("json.tmp")).unwrap();

        let source = MemorySource { fail: Some("nope"), ..MemorySource::default() };
        assert!(generate(&source, &out).await.is_err());
    }
}
