//! Items that define the domain data model.
//!
//! These types mirror the content shapes defined in the CMS schema (see
//! `schema`) and are deserialized from GROQ query results. References are
//! already resolved by the queries, so none of these types ever points to
//! another document by ID only.

mod collection;
mod form;
mod image;
mod module;
mod page;
mod portable_text;
mod translated_string;

pub(crate) use self::{
    collection::{CollectionItem, Event, EventType, SitemapEntry},
    form::{EventRegistration, FieldKind, Lead, LeadSource, RegistrationForm},
    image::{ImageRef, ImageUrls},
    module::*,
    page::{FrontpageCandidate, Link, Logo, Page, Person},
    portable_text::{Block, ListKind, PortableText, PtNode, Span},
    translated_string::TranslatedString,
};


/// Deserializes `null` like a missing value. GROQ projections yield `null`
/// for fields that are not set on a document.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    use serde::Deserialize;
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
