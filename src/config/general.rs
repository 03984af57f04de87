use crate::model::TranslatedString;
use super::HttpHost;


#[derive(Debug, confique::Config)]
pub(crate) struct GeneralConfig {
    /// The name of the website. Used in the HTML `<title>`, in the header, as
    /// RSS channel title prefix and potentially more.
    pub(crate) site_title: TranslatedString,

    /// Short description of the website, used as default `<meta
    /// name="description">` for pages that don't define their own SEO
    /// description.
    pub(crate) site_description: Option<TranslatedString>,

    /// Public URL of this website (without path). Used for RSS feeds,
    /// sitemaps and canonical links, as those require absolute URLs.
    ///
    /// Example: "https://www.acme.example".
    pub(crate) site_url: HttpHost,
}
