//! Access to the headless CMS all content lives in.

use std::time::Duration;
use futures::future::BoxFuture;
use secrecy::SecretString;

use crate::{
    collections::CollectionType,
    locale::Locale,
    model::{
        CollectionItem, Event, EventRegistration, FrontpageCandidate, ImageUrls, Lead, Logo,
        Page, RegistrationForm, SitemapEntry,
    },
    prelude::*,
};


pub(crate) mod queries;
mod sanity;

#[cfg(test)]
pub(crate) mod memory;

pub(crate) use self::sanity::SanityClient;


#[derive(Debug, confique::Config)]
pub(crate) struct CmsConfig {
    /// ID of the Sanity project the content is stored in.
    #[config(env = "CAIRN_CMS_PROJECT_ID")]
    pub(crate) project_id: String,

    /// Name of the dataset inside the project.
    #[config(env = "CAIRN_CMS_DATASET", default = "production")]
    pub(crate) dataset: String,

    /// Version of the query API to use, as date string.
    #[config(default = "2024-08-01")]
    pub(crate) api_version: String,

    /// Whether to send read queries to the API CDN. Results can be a few
    /// seconds old, but responses are much faster.
    #[config(default = true)]
    pub(crate) use_cdn: bool,

    /// API token with write access. Only required for storing leads
    /// (contact and event registration forms). Without it, form submissions
    /// fail.
    #[config(env = "CAIRN_CMS_TOKEN")]
    pub(crate) token: Option<SecretString>,

    /// Timeout for every request to the CMS.
    #[config(default = "10s", deserialize_with = crate::config::deserialize_duration)]
    pub(crate) timeout: Duration,

    /// How long a page module waits for its own data (logos, latest
    /// articles, ...). After that, the module is rendered as placeholder
    /// and the rest of the page is delivered without it.
    #[config(default = "3s", deserialize_with = crate::config::deserialize_duration)]
    pub(crate) fetch_timeout: Duration,
}

impl CmsConfig {
    pub(crate) fn image_urls(&self) -> ImageUrls {
        ImageUrls::new(&self.project_id, &self.dataset)
    }

    /// Validates values that cannot be checked by their type alone.
    pub(crate) fn validate(&self) -> Result<()> {
        let is_valid_name = |s: &str| !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !is_valid_name(&self.project_id) {
            bail!("'cms.project_id' is invalid: '{}'", self.project_id);
        }
        if !is_valid_name(&self.dataset) {
            bail!("'cms.dataset' is invalid: '{}'", self.dataset);
        }
        if chrono::NaiveDate::parse_from_str(&self.api_version, "%Y-%m-%d").is_err() {
            bail!("'cms.api_version' has to be a date like '2024-08-01', but is '{}'",
                self.api_version);
        }

        Ok(())
    }
}


/// Everything the website reads from or writes to the CMS.
///
/// All lookups by slug return `Ok(None)` if nothing was found. Errors are
/// reserved for failed requests and unexpected responses.
pub(crate) trait ContentSource: Send + Sync {
    /// The page with the given slug in the given locale.
    fn page<'a>(&'a self, locale: &'static Locale, slug: &'a str)
        -> BoxFuture<'a, Result<Option<Page>>>;

    /// All pages that contain at least one collection frontpage module, in
    /// all locales.
    fn frontpage_candidates(&self) -> BoxFuture<'_, Result<Vec<FrontpageCandidate>>>;

    /// The newest items of a collection, newest first.
    fn collection_items(&self, collection: CollectionType, locale: &'static Locale, limit: u32)
        -> BoxFuture<'_, Result<Vec<CollectionItem>>>;

    fn collection_item<'a>(
        &'a self,
        collection: CollectionType,
        locale: &'static Locale,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<CollectionItem>>>;

    /// All events of a locale, ordered by start time.
    fn events(&self, locale: &'static Locale) -> BoxFuture<'_, Result<Vec<Event>>>;

    fn event<'a>(&'a self, locale: &'static Locale, slug: &'a str)
        -> BoxFuture<'a, Result<Option<Event>>>;

    fn logos(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Logo>>>;

    /// Title of the page that is the frontpage of `collection`.
    fn frontpage_title(&self, collection: CollectionType, locale: &'static Locale)
        -> BoxFuture<'_, Result<Option<String>>>;

    /// Pages and collection items of a locale that belong in the sitemap.
    fn sitemap_entries(&self, locale: &'static Locale) -> BoxFuture<'_, Result<Vec<SitemapEntry>>>;

    fn registration_form<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<RegistrationForm>>>;

    /// Registration setup of the event with document ID `id`, in any locale.
    fn event_registration<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<EventRegistration>>>;

    /// Stores a lead as new document.
    fn create_lead<'a>(&'a self, lead: &'a Lead) -> BoxFuture<'a, Result<()>>;
}
