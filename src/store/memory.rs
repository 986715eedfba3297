use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CategoryStore, PoiStore, UserStore};
use crate::error::AppError;
use crate::models::{Category, PointOfInterest, User};

/// Keyed by id; ids are ULIDs so map order is creation order.
#[derive(Debug, Default)]
struct Collections {
    users: BTreeMap<String, User>,
    pois: BTreeMap<String, PointOfInterest>,
    categories: BTreeMap<String, Category>,
}

/// A store that lives and dies with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::EmailTaken);
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_full_name(&self, full_name: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.full_name == full_name).cloned())
    }

    async fn regular_users(&self) -> Result<Vec<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().filter(|u| !u.is_admin).cloned().collect())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .users
            .get_mut(&user.id)
            .ok_or(AppError::UnknownUser)?;
        *stored = User {
            contributed_pois: stored.contributed_pois,
            ..user.clone()
        };
        Ok(())
    }

    async fn adjust_contributions(&self, id: &str, delta: i32) -> Result<(), AppError> {
        if let Some(user) = self.inner.write().await.users.get_mut(id) {
            user.contributed_pois += delta;
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.pois.retain(|_, poi| poi.contributor_id != id);
        inner.categories.retain(|_, category| category.contributor_id != id);
        inner.users.remove(id);
        Ok(())
    }
}

#[async_trait]
impl PoiStore for MemoryStore {
    async fn insert_poi(&self, poi: &PointOfInterest) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.pois.insert(poi.id.clone(), poi.clone());
        Ok(())
    }

    async fn poi_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, AppError> {
        Ok(self.inner.read().await.pois.get(id).cloned())
    }

    async fn pois(&self) -> Result<Vec<PointOfInterest>, AppError> {
        Ok(self.inner.read().await.pois.values().cloned().collect())
    }

    async fn pois_by_contributor(
        &self,
        contributor_id: &str,
    ) -> Result<Vec<PointOfInterest>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .pois
            .values()
            .filter(|poi| poi.contributor_id == contributor_id)
            .cloned()
            .collect())
    }

    async fn update_poi(&self, poi: &PointOfInterest) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let stored = inner.pois.get_mut(&poi.id).ok_or(AppError::NotFound)?;
        *stored = PointOfInterest {
            image_urls: std::mem::take(&mut stored.image_urls),
            ..poi.clone()
        };
        Ok(())
    }

    async fn append_image(&self, id: &str, url: &str) -> Result<PointOfInterest, AppError> {
        let mut inner = self.inner.write().await;
        let stored = inner.pois.get_mut(id).ok_or(AppError::NotFound)?;
        stored.image_urls.push(url.to_owned());
        Ok(stored.clone())
    }

    async fn delete_poi(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.inner.write().await.pois.remove(id).is_some())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, category: &Category) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.categories.insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn categories_by_contributor(
        &self,
        contributor_id: &str,
    ) -> Result<Vec<Category>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .categories
            .values()
            .filter(|category| category.contributor_id == contributor_id)
            .cloned()
            .collect())
    }

    async fn categories_by_ids(&self, ids: &[String]) -> Result<Vec<Category>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .categories
            .values()
            .filter(|category| ids.contains(&category.id))
            .cloned()
            .collect())
    }
}
