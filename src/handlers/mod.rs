use axum::extract::Multipart;
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::images::UploadedImage;
use crate::models::Location;

pub(crate) mod accounts;
pub(crate) mod category;
pub(crate) mod poi;

/// The fields of the add and update forms for a point of interest.
///
/// Built from raw key/value pairs because `categories` may repeat and the add form
/// arrives as multipart.
#[derive(Debug, Default, Validate)]
pub(crate) struct PoiForm {
    #[validate(length(min = 1, message = "Name is required"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub(crate) description: String,
    #[validate(custom = "validate_latitude")]
    pub(crate) lat: String,
    #[validate(custom = "validate_longitude")]
    pub(crate) lon: String,
    pub(crate) categories: Vec<String>,
    /// Empty keeps the current thumbnail.
    pub(crate) thumbnail: String,
    /// Full name of the new contributor; empty keeps the current one.
    pub(crate) contributor: String,
}

impl PoiForm {
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = PoiForm::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value.trim().to_owned(),
                "description" => form.description = value.trim().to_owned(),
                "lat" => form.lat = value.trim().to_owned(),
                "lon" => form.lon = value.trim().to_owned(),
                "categories" if !value.is_empty() => form.categories.push(value),
                "thumbnail" => form.thumbnail = value,
                "contributor" => form.contributor = value.trim().to_owned(),
                _ => {}
            }
        }
        form
    }

    /// The submitted coordinates. Only meaningful once the form has validated.
    pub(crate) fn location(&self) -> Result<Location, AppError> {
        let parse = |value: &str, what: &str| {
            value
                .parse::<f64>()
                .map_err(|_| AppError::Invalid(format!("{} must be a number", what)))
        };
        Ok(Location {
            latitude: parse(&self.lat, "Latitude")?,
            longitude: parse(&self.lon, "Longitude")?,
        })
    }
}

fn validate_coordinate(value: &str, what: &str, bound: f64) -> Result<(), ValidationError> {
    let message = match value.parse::<f64>() {
        _ if value.is_empty() => format!("{} is required", what),
        Ok(number) if number.is_finite() && number.abs() <= bound => return Ok(()),
        Ok(_) => format!("{} must be between -{} and {}", what, bound, bound),
        Err(_) => format!("{} must be a number", what),
    };

    let mut error = ValidationError::new("coordinate");
    error.message = Some(message.into());
    Err(error)
}

fn validate_latitude(value: &str) -> Result<(), ValidationError> {
    validate_coordinate(value, "Latitude", 90.0)
}

fn validate_longitude(value: &str) -> Result<(), ValidationError> {
    validate_coordinate(value, "Longitude", 180.0)
}

/// Split a multipart body into its text fields and the `image` file, if one was sent.
pub(crate) async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Vec<(String, String)>, Option<UploadedImage>), AppError> {
    let mut pairs = Vec::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let bytes = field.bytes().await?;
            image = Some(UploadedImage { file_name, bytes });
        } else {
            let value = field.text().await?;
            pairs.push((name, value));
        }
    }

    Ok((pairs, image))
}
