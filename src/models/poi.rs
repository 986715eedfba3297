use oso::PolarClass;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Point of interest model
#[derive(Debug, Clone, PartialEq, PolarClass)]
pub struct PointOfInterest {
    #[polar(attribute)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    /// Never empty once persisted. The first entry is the image the point was created with.
    pub image_urls: Vec<String>,
    /// One of `image_urls`.
    pub thumbnail_url: String,
    pub category_ids: Vec<String>,
    #[polar(attribute)]
    pub contributor_id: String,
}

impl PointOfInterest {
    /// A new point whose only image is also its thumbnail.
    pub fn new(
        name: &str,
        description: &str,
        location: Location,
        image_url: String,
        category_ids: Vec<String>,
        contributor_id: &str,
    ) -> Self {
        Self {
            id: super::new_id(),
            name: name.trim().to_owned(),
            description: description.trim().to_owned(),
            location,
            thumbnail_url: image_url.clone(),
            image_urls: vec![image_url],
            category_ids,
            contributor_id: contributor_id.to_owned(),
        }
    }

    /// Every image but the first.
    pub fn secondary_images(&self) -> &[String] {
        self.image_urls.get(1..).unwrap_or_default()
    }

    pub fn has_image(&self, url: &str) -> bool {
        self.image_urls.iter().any(|image| image == url)
    }
}
