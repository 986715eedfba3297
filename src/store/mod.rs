//! Persistence
//!
//! Each collection is a trait so handlers never see the database. [`SeaOrmStore`] is the
//! production implementation; [`MemoryStore`] keeps everything in process for local runs
//! and tests.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Category, PointOfInterest, User};

mod memory;
mod sea;

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn user_by_full_name(&self, full_name: &str) -> Result<Option<User>, AppError>;

    /// Every user without the admin flag, oldest first.
    async fn regular_users(&self) -> Result<Vec<User>, AppError>;

    /// Overwrite a user's profile fields. The contribution counter is left alone.
    /// Fails with [`AppError::UnknownUser`] if the user is gone.
    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    /// Atomically add `delta` to a user's contribution counter.
    async fn adjust_contributions(&self, id: &str, delta: i32) -> Result<(), AppError>;

    /// Delete a user together with the points of interest and categories they own.
    async fn delete_user(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PoiStore: Send + Sync {
    async fn insert_poi(&self, poi: &PointOfInterest) -> Result<(), AppError>;

    async fn poi_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, AppError>;

    /// Every point of interest, oldest first.
    async fn pois(&self) -> Result<Vec<PointOfInterest>, AppError>;

    async fn pois_by_contributor(&self, contributor_id: &str)
        -> Result<Vec<PointOfInterest>, AppError>;

    /// Overwrite a point of interest's details. The image list is left alone, since it only
    /// grows through [`PoiStore::append_image`]. Fails with [`AppError::NotFound`] if it is gone.
    async fn update_poi(&self, poi: &PointOfInterest) -> Result<(), AppError>;

    /// Atomically append an image URL, returning the updated point.
    async fn append_image(&self, id: &str, url: &str) -> Result<PointOfInterest, AppError>;

    /// Returns whether anything was deleted.
    async fn delete_poi(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert_category(&self, category: &Category) -> Result<(), AppError>;

    async fn categories_by_contributor(
        &self,
        contributor_id: &str,
    ) -> Result<Vec<Category>, AppError>;

    /// The categories among `ids` that exist, oldest first.
    async fn categories_by_ids(&self, ids: &[String]) -> Result<Vec<Category>, AppError>;
}

/// Everything the handlers need from persistence.
pub trait Store: UserStore + PoiStore + CategoryStore {}

impl<T> Store for T where T: UserStore + PoiStore + CategoryStore {}
