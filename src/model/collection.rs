use std::fmt;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::collections::CollectionType;
use super::{ImageRef, Person, PortableText, RegistrationForm};


/// An entry of one of the article-like collections (articles, docs,
/// changelog, newsletter).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionItem {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    #[serde(rename = "language")]
    pub(crate) locale: String,
    pub(crate) published_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) excerpt: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) body: PortableText,
    pub(crate) image: Option<ImageRef>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) authors: Vec<Person>,
    /// Release version, only used by changelog entries.
    pub(crate) version: Option<String>,
}

impl CollectionItem {
    /// The date shown to readers and used in feeds.
    pub(crate) fn date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.updated_at)
    }

    /// The excerpt, or the beginning of the body if none was written.
    pub(crate) fn summary(&self) -> String {
        match &self.excerpt {
            Some(e) if !e.trim().is_empty() => e.clone(),
            _ => self.body.excerpt(240),
        }
    }
}

/// An event document (`collection.events`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Event {
    #[serde(rename = "_id")]
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    #[serde(rename = "language")]
    pub(crate) locale: String,
    pub(crate) start_date_time: DateTime<Utc>,
    /// Length in hours. Missing means one hour.
    pub(crate) duration: Option<f64>,
    /// IANA time zone name the event is announced in, e.g. "Europe/Oslo".
    /// Only used for display.
    pub(crate) timezone: Option<String>,
    pub(crate) event_type: EventType,
    pub(crate) location: Option<Location>,
    /// Join link for online events.
    pub(crate) online_url: Option<String>,
    pub(crate) summary: Option<String>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) description: PortableText,
    pub(crate) image: Option<ImageRef>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) speakers: Vec<Person>,
    pub(crate) registration_form: Option<RegistrationForm>,
    #[serde(rename = "_updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EventType {
    Webinar,
    Video,
    Physical,
    Hybrid,
}

impl EventType {
    pub(crate) const ALL: [EventType; 4] =
        [EventType::Webinar, EventType::Video, EventType::Physical, EventType::Hybrid];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EventType::Webinar => "webinar",
            EventType::Video => "video",
            EventType::Physical => "physical",
            EventType::Hybrid => "hybrid",
        }
    }

    pub(crate) fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Location {
    pub(crate) name: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) city: Option<String>,
}

impl Location {
    /// All non-empty parts joined with commas.
    pub(crate) fn one_line(&self) -> String {
        [&self.name, &self.address, &self.city]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Everything that gets an entry in the sitemap of a locale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SitemapEntry {
    pub(crate) slug: String,
    /// `None` for plain pages.
    pub(crate) collection: Option<CollectionType>,
    #[serde(rename = "_updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "crate::model::nullable")]
    pub(crate) no_index: bool,
}
