//! In-memory content source used by tests instead of a real CMS.

use std::{sync::Mutex, time::Duration};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::{
    collections::CollectionType,
    locale::Locale,
    model::{
        CollectionItem, Event, EventRegistration, FrontpageCandidate, Lead, Logo, Page,
        RegistrationForm, SitemapEntry,
    },
    prelude::*,
};
use super::ContentSource;


#[derive(Default)]
pub(crate) struct MemorySource {
    pub(crate) pages: Vec<Page>,
    pub(crate) candidates: Vec<FrontpageCandidate>,
    pub(crate) items: Vec<(CollectionType, CollectionItem)>,
    pub(crate) events: Vec<Event>,
    pub(crate) logos: Vec<Logo>,
    pub(crate) forms: Vec<RegistrationForm>,
    pub(crate) leads: Mutex<Vec<Lead>>,

    /// If set, every operation fails with this message.
    pub(crate) fail: Option<&'static str>,
    /// If set, every read operation sleeps this long before answering.
    pub(crate) delay: Option<Duration>,
}

/// Deserializes test data written as JSON.
pub(crate) fn from_json<T: serde::de::DeserializeOwned>(v: Value) -> T {
    serde_json::from_value(v).expect("invalid test data")
}

impl MemorySource {
    async fn answer<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(f()),
        }
    }

    fn items_of(&self, collection: CollectionType, locale: &Locale) -> Vec<CollectionItem> {
        let mut out = self.items.iter()
            .filter(|(c, item)| *c == collection && item.locale == locale.code)
            .map(|(_, item)| item.clone())
            .collect::<Vec<_>>();
        out.sort_by_key(|item| std::cmp::Reverse(item.date()));
        out
    }
}

impl ContentSource for MemorySource {
    fn page<'a>(&'a self, locale: &'static Locale, slug: &'a str)
        -> BoxFuture<'a, Result<Option<Page>>>
    {
        self.answer(move || {
            self.pages.iter().find(|p| p.locale == locale.code && p.slug == slug).cloned()
        }).boxed()
    }

    fn frontpage_candidates(&self) -> BoxFuture<'_, Result<Vec<FrontpageCandidate>>> {
        self.answer(|| self.candidates.clone()).boxed()
    }

    fn collection_items(&self, collection: CollectionType, locale: &'static Locale, limit: u32)
        -> BoxFuture<'_, Result<Vec<CollectionItem>>>
    {
        self.answer(move || {
            let mut items = self.items_of(collection, locale);
            items.truncate(limit as usize);
            items
        }).boxed()
    }

    fn collection_item<'a>(
        &'a self,
        collection: CollectionType,
        locale: &'static Locale,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<CollectionItem>>> {
        self.answer(move || {
            self.items_of(collection, locale).into_iter().find(|item| item.slug == slug)
        }).boxed()
    }

    fn events(&self, locale: &'static Locale) -> BoxFuture<'_, Result<Vec<Event>>> {
        self.answer(move || {
            let mut events = self.events.iter()
                .filter(|e| e.locale == locale.code)
                .cloned()
                .collect::<Vec<_>>();
            events.sort_by_key(|e| e.start_date_time);
            events
        }).boxed()
    }

    fn event<'a>(&'a self, locale: &'static Locale, slug: &'a str)
        -> BoxFuture<'a, Result<Option<Event>>>
    {
        self.answer(move || {
            self.events.iter().find(|e| e.locale == locale.code && e.slug == slug).cloned()
        }).boxed()
    }

    fn logos(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Logo>>> {
        self.answer(move || self.logos.iter().take(limit as usize).cloned().collect()).boxed()
    }

    fn frontpage_title(&self, collection: CollectionType, locale: &'static Locale)
        -> BoxFuture<'_, Result<Option<String>>>
    {
        self.answer(move || {
            self.pages.iter()
                .filter(|p| p.locale == locale.code)
                .find(|p| p.modules.iter().any(|m| m.frontpage_of() == Some(collection)))
                .map(|p| p.title.clone())
        }).boxed()
    }

    fn sitemap_entries(&self, locale: &'static Locale) -> BoxFuture<'_, Result<Vec<SitemapEntry>>> {
        self.answer(move || {
            let pages = self.pages.iter()
                .filter(|p| p.locale == locale.code)
                .map(|p| SitemapEntry {
                    slug: p.slug.clone(),
                    collection: None,
                    updated_at: p.updated_at,
                    no_index: p.seo.no_index,
                });
            let items = self.items.iter()
                .filter(|(_, item)| item.locale == locale.code)
                .map(|(c, item)| SitemapEntry {
                    slug: item.slug.clone(),
                    collection: Some(*c),
                    updated_at: item.updated_at,
                    no_index: false,
                });
            let events = self.events.iter()
                .filter(|e| e.locale == locale.code)
                .map(|e| SitemapEntry {
                    slug: e.slug.clone(),
                    collection: Some(CollectionType::Events),
                    updated_at: e.updated_at,
                    no_index: false,
                });
            pages.chain(items).chain(events).collect()
        }).boxed()
    }

    fn registration_form<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<RegistrationForm>>>
    {
        self.answer(move || self.forms.iter().find(|f| f.id == id).cloned()).boxed()
    }

    fn event_registration<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<EventRegistration>>>
    {
        self.answer(move || {
            self.events.iter()
                .find(|e| e.id == id)
                .map(|e| EventRegistration { registration_form: e.registration_form.clone() })
        }).boxed()
    }

    fn create_lead<'a>(&'a self, lead: &'a Lead) -> BoxFuture<'a, Result<()>> {
        async move {
            match self.fail {
                Some(msg) => Err(anyhow!("{msg}")),
                None => {
                    self.leads.lock().unwrap().push(lead.clone());
                    Ok(())
                }
            }
        }.boxed()
    }
}
