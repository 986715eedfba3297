//! HTML views
//!
//! Templates are compiled into the binary and rendered with minijinja. View structs here
//! are the only shapes templates ever see; in particular password hashes never reach them.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::Environment;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Category, PointOfInterest, User};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("main.html", include_str!("../templates/main.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("report.html", include_str!("../templates/report.html")),
    ("poi.html", include_str!("../templates/poi.html")),
    ("updatepoi.html", include_str!("../templates/updatepoi.html")),
    ("settings.html", include_str!("../templates/settings.html")),
];

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn try_new() -> Result<Self, AppError> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<Html<String>, AppError> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(context)?))
    }

    /// Render with an explicit status, as failed form submissions do.
    pub fn render_with_status<S: Serialize>(
        &self,
        status: StatusCode,
        name: &str,
        context: S,
    ) -> Result<Response, AppError> {
        Ok((status, self.render(name, context)?).into_response())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
    pub contributed_pois: i32,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            contributed_pois: user.contributed_pois,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        CategoryView {
            id: category.id.clone(),
            name: category.name.clone(),
            description: category.description.clone(),
        }
    }
}

/// A point of interest with its contributor and categories resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PoiView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
    pub thumbnail: String,
    /// All images, upload order.
    pub images: Vec<String>,
    /// Every image but the first.
    pub secondary_images: Vec<String>,
    pub category_ids: Vec<String>,
    pub categories: Vec<CategoryView>,
    /// `None` if the contributor record is gone.
    pub contributor: Option<UserView>,
}

impl PoiView {
    pub fn new(poi: &PointOfInterest, contributor: Option<&User>, categories: &[Category]) -> Self {
        PoiView {
            id: poi.id.clone(),
            name: poi.name.clone(),
            description: poi.description.clone(),
            lat: poi.location.latitude,
            lon: poi.location.longitude,
            thumbnail: poi.thumbnail_url.clone(),
            images: poi.image_urls.clone(),
            secondary_images: poi.secondary_images().to_vec(),
            category_ids: poi.category_ids.clone(),
            categories: categories
                .iter()
                .filter(|category| poi.category_ids.contains(&category.id))
                .map(CategoryView::from)
                .collect(),
            contributor: contributor.map(UserView::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use minijinja::context;

    #[test]
    fn every_template_compiles_and_escapes() {
        let views = Views::try_new().unwrap();
        let user = User::new("<b>Ada</b>", "Lovelace", "ada@example.com", "hash".into());
        let html = views
            .render(
                "home.html",
                context! {
                    title => "User Dashboard",
                    user => UserView::from(&user),
                    pois => Vec::<PoiView>::new(),
                    categories => Vec::<CategoryView>::new(),
                    users => Vec::<UserView>::new(),
                    errors => Vec::<String>::new(),
                },
            )
            .unwrap();
        assert!(html.0.contains("&lt;b&gt;Ada"));
        assert!(!html.0.contains("<b>"));
        assert!(!html.0.contains("hash"));
    }

    #[test]
    fn poi_view_keeps_only_its_own_categories() {
        let owner = User::new("Ada", "Lovelace", "ada@example.com", "hash".into());
        let beaches = Category::new("Beaches", "", &owner.id);
        let forts = Category::new("Forts", "", &owner.id);
        let mut poi = PointOfInterest::new(
            "Lighthouse",
            "Hook Head",
            Location {
                latitude: 52.12,
                longitude: -6.93,
            },
            "https://img.test/1.jpg".into(),
            vec![forts.id.clone()],
            &owner.id,
        );
        poi.image_urls.push("https://img.test/2.jpg".into());

        let view = PoiView::new(&poi, Some(&owner), &[beaches, forts]);
        assert_eq!(view.categories.len(), 1);
        assert_eq!(view.categories[0].name, "Forts");
        assert_eq!(view.thumbnail, "https://img.test/1.jpg");
        assert_eq!(view.secondary_images, vec!["https://img.test/2.jpg".to_owned()]);
        assert_eq!(view.contributor.map(|c| c.full_name).as_deref(), Some("Ada Lovelace"));
    }
}
