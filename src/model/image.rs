use serde::Deserialize;


/// An image field as stored by the CMS: a reference to an image asset plus
/// editorial metadata.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImageRef {
    pub(crate) asset: AssetRef,
    #[serde(default)]
    pub(crate) alt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AssetRef {
    #[serde(rename = "_ref")]
    pub(crate) reference: String,
}

/// The parts of an asset ID like `image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg`.
#[derive(Debug, PartialEq, Eq)]
struct AssetId<'a> {
    id: &'a str,
    width: u32,
    height: u32,
    format: &'a str,
}

impl<'a> AssetId<'a> {
    fn parse(reference: &'a str) -> Option<Self> {
        let rest = reference.strip_prefix("image-")?;
        let (rest, format) = rest.rsplit_once('-')?;
        let (id, dimensions) = rest.rsplit_once('-')?;
        let (width, height) = dimensions.split_once('x')?;

        Some(Self {
            id,
            width: width.parse().ok()?,
            height: height.parse().ok()?,
            format,
        })
    }
}

/// Builds public CDN URLs for image assets.
#[derive(Debug, Clone)]
pub(crate) struct ImageUrls {
    project_id: String,
    dataset: String,
}

impl ImageUrls {
    pub(crate) fn new(project_id: &str, dataset: &str) -> Self {
        Self { project_id: project_id.to_owned(), dataset: dataset.to_owned() }
    }

    /// Returns the URL of the image, optionally scaled down to `width`.
    /// Returns `None` for malformed asset references.
    pub(crate) fn url(&self, image: &ImageRef, width: Option<u32>) -> Option<String> {
        let asset = AssetId::parse(&image.asset.reference)?;
        let mut url = format!(
            "https://cdn.sanity.io/images/{}/{}/{}-{}x{}.{}",
            self.project_id,
            self.dataset,
            asset.id,
            asset.width,
            asset.height,
            asset.format,
        );

        // Never upscale, SVGs don't need scaling.
        if let Some(w) = width.filter(|w| *w < asset.width && asset.format != "svg") {
            url.push_str(&format!("?w={w}&auto=format"));
        }

        Some(url)
    }

    /// Intrinsic dimensions encoded in the asset reference.
    pub(crate) fn dimensions(image: &ImageRef) -> Option<(u32, u32)> {
        AssetId::parse(&image.asset.reference).map(|a| (a.width, a.height))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn image(reference: &str) -> ImageRef {
        ImageRef { asset: AssetRef { reference: reference.into() }, alt: None }
    }

    #[test]
    fn parse_asset_ids() {
        assert_eq!(
            AssetId::parse("image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg"),
            Some(AssetId { id: "Tb9Ew8CXIwaY6R1kjMvI0uRR", width: 2000, height: 3000, format: "jpg" }),
        );
        assert_eq!(AssetId::parse("file-abc-pdf"), None);
        assert_eq!(AssetId::parse("image-abc-20x-png"), None);
    }

    #[test]
    fn urls() {
        let urls = ImageUrls::new("p1", "production");
        let img = image("image-abc-2000x1000-jpg");
        assert_eq!(
            urls.url(&img, None).unwrap(),
            "https://cdn.sanity.io/images/p1/production/abc-2000x1000.jpg",
        );
        assert_eq!(
            urls.url(&img, Some(800)).unwrap(),
            "https://cdn.sanity.io/images/p1/production/abc-2000x1000.jpg?w=800&auto=format",
        );
        assert!(!urls.url(&img, Some(4000)).unwrap().contains("?w="));
        assert_eq!(urls.url(&image("broken"), None), None);
    }
}
