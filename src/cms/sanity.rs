use std::time::Instant;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{header, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tap::TapFallible;

use crate::{
    collections::CollectionType,
    locale::Locale,
    model::{
        CollectionItem, Event, EventRegistration, FrontpageCandidate, Lead, Logo, Page,
        RegistrationForm, SitemapEntry,
    },
    prelude::*,
};
use super::{queries, CmsConfig, ContentSource};


/// Client for the Sanity HTTP API.
pub(crate) struct SanityClient {
    http: reqwest::Client,
    project_id: String,
    dataset: String,
    api_version: String,
    use_cdn: bool,
    token: Option<SecretString>,
}

impl SanityClient {
    pub(crate) fn new(config: &CmsConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("cairn/{}", crate::version::identifier()))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            api_version: config.api_version.clone(),
            use_cdn: config.use_cdn,
            token: config.token.as_ref().map(|t| SecretString::from(t.expose_secret().to_owned())),
        })
    }

    fn base_url(&self, cdn: bool) -> String {
        format!(
            "https://{}.{}.sanity.io/v{}",
            self.project_id,
            if cdn { "apicdn" } else { "api" },
            self.api_version,
        )
    }

    fn query_url(&self, query: &str, params: &[(&str, Value)]) -> String {
        let mut qs = form_urlencoded::Serializer::new(String::new());
        qs.append_pair("query", query.trim());
        for (name, value) in params {
            qs.append_pair(&format!("${name}"), &value.to_string());
        }
        qs.append_pair("perspective", "published");

        format!("{}/data/query/{}?{}", self.base_url(self.use_cdn), self.dataset, qs.finish())
    }

    /// Runs a GROQ query and deserializes its `result`.
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, Value)],
    ) -> Result<T> {
        #[derive(Deserialize)]
        struct QueryResponse<T> {
            result: T,
        }

        let before = Instant::now();
        let url = self.query_url(query, params);
        let response = self.http.get(&url)
            .send()
            .await
            .context("CMS query request failed")?;

        let body = Self::check_response(response).await?;
        let out = serde_json::from_slice::<QueryResponse<T>>(&body)
            .context("failed to deserialize CMS query result")
            .tap_err(|_| trace!("CMS response: {}", String::from_utf8_lossy(&body)))?;

        trace!(
            "CMS query with params {:?} took {:.2?} ({} bytes)",
            params.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            before.elapsed(),
            body.len(),
        );

        Ok(out.result)
    }

    /// Sends a list of mutations in one transaction.
    async fn mutate(&self, mutations: Value) -> Result<()> {
        let Some(token) = &self.token else {
            bail!("no CMS token configured ('cms.token'), cannot write to the CMS");
        };

        let url = format!("{}/data/mutate/{}", self.base_url(false), self.dataset);
        let body = serde_json::to_vec(&json!({ "mutations": mutations }))?;
        let response = self.http.post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(token.expose_secret())
            .body(body)
            .send()
            .await
            .context("CMS mutation request failed")?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Checks that the query API is reachable and the dataset exists.
    pub(crate) async fn ping(&self) -> Result<u64> {
        self.query(queries::PING, &[]).await
    }

    /// Returns the body of successful responses. For others, returns an
    /// error containing the CMS error description if there is one.
    async fn check_response(response: reqwest::Response) -> Result<Bytes> {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetails,
        }

        #[derive(Deserialize)]
        struct ErrorDetails {
            description: Option<String>,
            #[serde(rename = "type")]
            ty: Option<String>,
        }

        let status = response.status();
        let body = response.bytes().await.context("failed to download CMS response")?;
        if status.is_success() {
            return Ok(body);
        }

        let details = serde_json::from_slice::<ErrorResponse>(&body).ok()
            .map(|r| r.error)
            .and_then(|e| e.description.or(e.ty));

        match (status, details) {
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => bail!(
                "CMS returned {status}. Check 'cms.token' and its permissions!",
            ),
            (_, Some(details)) => bail!("CMS returned {status}: {details}"),
            (_, None) => bail!("CMS returned unexpected HTTP code {status}"),
        }
    }
}

fn locale_param(locale: &Locale) -> (&'static str, Value) {
    ("locale", Value::from(locale.code))
}

impl ContentSource for SanityClient {
    fn page<'a>(&'a self, locale: &'static Locale, slug: &'a str)
        -> BoxFuture<'a, Result<Option<Page>>>
    {
        async move {
            self.query(&queries::PAGE, &[locale_param(locale), ("slug", slug.into())]).await
        }.boxed()
    }

    fn frontpage_candidates(&self) -> BoxFuture<'_, Result<Vec<FrontpageCandidate>>> {
        async move {
            self.query(queries::FRONTPAGE_CANDIDATES, &[]).await
        }.boxed()
    }

    fn collection_items(&self, collection: CollectionType, locale: &'static Locale, limit: u32)
        -> BoxFuture<'_, Result<Vec<CollectionItem>>>
    {
        async move {
            let params = [
                locale_param(locale),
                ("docType", collection.document_type().into()),
                ("limit", limit.into()),
            ];
            self.query(&queries::COLLECTION_ITEMS, &params).await
        }.boxed()
    }

    fn collection_item<'a>(
        &'a self,
        collection: CollectionType,
        locale: &'static Locale,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<CollectionItem>>> {
        async move {
            let params = [
                locale_param(locale),
                ("docType", collection.document_type().into()),
                ("slug", slug.into()),
            ];
            self.query(&queries::COLLECTION_ITEM, &params).await
        }.boxed()
    }

    fn events(&self, locale: &'static Locale) -> BoxFuture<'_, Result<Vec<Event>>> {
        async move {
            self.query(&queries::EVENTS, &[locale_param(locale)]).await
        }.boxed()
    }

    fn event<'a>(&'a self, locale: &'static Locale, slug: &'a str)
        -> BoxFuture<'a, Result<Option<Event>>>
    {
        async move {
            self.query(&queries::EVENT, &[locale_param(locale), ("slug", slug.into())]).await
        }.boxed()
    }

    fn logos(&self, limit: u32) -> BoxFuture<'_, Result<Vec<Logo>>> {
        async move {
            self.query(queries::LOGOS, &[("limit", limit.into())]).await
        }.boxed()
    }

    fn frontpage_title(&self, collection: CollectionType, locale: &'static Locale)
        -> BoxFuture<'_, Result<Option<String>>>
    {
        async move {
            let params = [
                locale_param(locale),
                ("moduleType", collection.frontpage_module_type().into()),
            ];
            self.query(queries::FRONTPAGE_TITLE, &params).await
        }.boxed()
    }

    fn sitemap_entries(&self, locale: &'static Locale) -> BoxFuture<'_, Result<Vec<SitemapEntry>>> {
        async move {
            self.query(queries::SITEMAP_ENTRIES, &[locale_param(locale)]).await
        }.boxed()
    }

    fn registration_form<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<RegistrationForm>>>
    {
        async move {
            self.query(&queries::REGISTRATION_FORM, &[("id", id.into())]).await
        }.boxed()
    }

    fn event_registration<'a>(&'a self, id: &'a str)
        -> BoxFuture<'a, Result<Option<EventRegistration>>>
    {
        async move {
            self.query(&queries::EVENT_REGISTRATION, &[("id", id.into())]).await
        }.boxed()
    }

    fn create_lead<'a>(&'a self, lead: &'a Lead) -> BoxFuture<'a, Result<()>> {
        async move {
            let mut doc = serde_json::to_value(lead)?;
            doc["_type"] = "lead".into();
            self.mutate(json!([{ "create": doc }])).await
        }.boxed()
    }
}
