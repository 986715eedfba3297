use async_trait::async_trait;
use entity::{category, point_of_interest, user_account};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, NotSet, QueryFilter, QueryOrder, Schema, Set, TransactionTrait,
};
use serde_json::Value as Json;

use super::{CategoryStore, PoiStore, UserStore};
use crate::error::AppError;
use crate::models::{Category, Location, PointOfInterest, User};

/// Store backed by a SeaORM connection (PostgreSQL in production).
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Attempt to connect to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self, DbErr> {
        let db = Database::connect(url).await?;
        Ok(Self { db })
    }

    /// Create any missing tables. Users first, since the others reference them.
    pub async fn ensure_schema(&self) -> Result<(), DbErr> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);

        let mut statements = vec![
            schema.create_table_from_entity(user_account::Entity),
            schema.create_table_from_entity(point_of_interest::Entity),
            schema.create_table_from_entity(category::Entity),
        ];
        for statement in statements.iter_mut() {
            statement.if_not_exists();
            self.db.execute(backend.build(&*statement)).await?;
        }

        Ok(())
    }
}

impl From<user_account::Model> for User {
    fn from(model: user_account::Model) -> Self {
        User {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            full_name: model.full_name,
            email: model.email,
            password: model.password,
            is_admin: model.is_admin,
            contributed_pois: model.contributed_pois,
        }
    }
}

impl From<point_of_interest::Model> for PointOfInterest {
    fn from(model: point_of_interest::Model) -> Self {
        PointOfInterest {
            id: model.id,
            name: model.name,
            description: model.description,
            location: Location {
                latitude: model.latitude,
                longitude: model.longitude,
            },
            image_urls: strings_from_json(&model.image_urls),
            thumbnail_url: model.thumbnail_url,
            category_ids: strings_from_json(&model.category_ids),
            contributor_id: model.contributor_id,
        }
    }
}

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Category {
            id: model.id,
            name: model.name,
            description: model.description,
            contributor_id: model.contributor_id,
        }
    }
}

fn strings_from_json(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn user_active_model(user: &User) -> user_account::ActiveModel {
    user_account::ActiveModel {
        id: Set(user.id.clone()),
        first_name: Set(user.first_name.clone()),
        last_name: Set(user.last_name.clone()),
        full_name: Set(user.full_name.clone()),
        email: Set(user.email.clone()),
        password: Set(user.password.clone()),
        is_admin: Set(user.is_admin),
        contributed_pois: Set(user.contributed_pois),
    }
}

fn poi_active_model(poi: &PointOfInterest) -> point_of_interest::ActiveModel {
    point_of_interest::ActiveModel {
        id: Set(poi.id.clone()),
        name: Set(poi.name.clone()),
        description: Set(poi.description.clone()),
        latitude: Set(poi.location.latitude),
        longitude: Set(poi.location.longitude),
        image_urls: Set(Json::from(poi.image_urls.clone())),
        thumbnail_url: Set(poi.thumbnail_url.clone()),
        category_ids: Set(Json::from(poi.category_ids.clone())),
        contributor_id: Set(poi.contributor_id.clone()),
    }
}

#[async_trait]
impl UserStore for SeaOrmStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        user_account::Entity::insert(user_active_model(user))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(user_account::Entity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(user_account::Entity::find()
            .filter(user_account::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn user_by_full_name(&self, full_name: &str) -> Result<Option<User>, AppError> {
        Ok(user_account::Entity::find()
            .filter(user_account::Column::FullName.eq(full_name))
            .order_by_asc(user_account::Column::Id)
            .one(&self.db)
            .await?
            .map(User::from))
    }

    async fn regular_users(&self) -> Result<Vec<User>, AppError> {
        Ok(user_account::Entity::find()
            .filter(user_account::Column::IsAdmin.eq(false))
            .order_by_asc(user_account::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        // the counter only moves through adjust_contributions
        let model = user_account::ActiveModel {
            contributed_pois: NotSet,
            ..user_active_model(user)
        };
        let result = user_account::Entity::update_many()
            .set(model)
            .filter(user_account::Column::Id.eq(user.id.as_str()))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::UnknownUser);
        }
        Ok(())
    }

    async fn adjust_contributions(&self, id: &str, delta: i32) -> Result<(), AppError> {
        user_account::Entity::update_many()
            .col_expr(
                user_account::Column::ContributedPois,
                Expr::col(user_account::Column::ContributedPois).add(delta),
            )
            .filter(user_account::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        // dropping the transaction on an early return rolls it back
        let txn = self.db.begin().await?;
        point_of_interest::Entity::delete_many()
            .filter(point_of_interest::Column::ContributorId.eq(id))
            .exec(&txn)
            .await?;
        category::Entity::delete_many()
            .filter(category::Column::ContributorId.eq(id))
            .exec(&txn)
            .await?;
        user_account::Entity::delete_many()
            .filter(user_account::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl PoiStore for SeaOrmStore {
    async fn insert_poi(&self, poi: &PointOfInterest) -> Result<(), AppError> {
        point_of_interest::Entity::insert(poi_active_model(poi))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn poi_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, AppError> {
        Ok(point_of_interest::Entity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .map(PointOfInterest::from))
    }

    async fn pois(&self) -> Result<Vec<PointOfInterest>, AppError> {
        Ok(point_of_interest::Entity::find()
            .order_by_asc(point_of_interest::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(PointOfInterest::from)
            .collect())
    }

    async fn pois_by_contributor(
        &self,
        contributor_id: &str,
    ) -> Result<Vec<PointOfInterest>, AppError> {
        Ok(point_of_interest::Entity::find()
            .filter(point_of_interest::Column::ContributorId.eq(contributor_id))
            .order_by_asc(point_of_interest::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(PointOfInterest::from)
            .collect())
    }

    async fn update_poi(&self, poi: &PointOfInterest) -> Result<(), AppError> {
        // images only grow through append_image
        let model = point_of_interest::ActiveModel {
            image_urls: NotSet,
            ..poi_active_model(poi)
        };
        let result = point_of_interest::Entity::update_many()
            .set(model)
            .filter(point_of_interest::Column::Id.eq(poi.id.as_str()))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn append_image(&self, id: &str, url: &str) -> Result<PointOfInterest, AppError> {
        let appended = Json::from(vec![url]).to_string();
        let result = point_of_interest::Entity::update_many()
            .col_expr(
                point_of_interest::Column::ImageUrls,
                Expr::cust_with_values(
                    r#"("image_urls"::jsonb || ?::jsonb)::json"#,
                    vec![appended],
                ),
            )
            .filter(point_of_interest::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        self.poi_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn delete_poi(&self, id: &str) -> Result<bool, AppError> {
        let result = point_of_interest::Entity::delete_many()
            .filter(point_of_interest::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl CategoryStore for SeaOrmStore {
    async fn insert_category(&self, category: &Category) -> Result<(), AppError> {
        let model = category::ActiveModel {
            id: Set(category.id.clone()),
            name: Set(category.name.clone()),
            description: Set(category.description.clone()),
            contributor_id: Set(category.contributor_id.clone()),
        };
        category::Entity::insert(model).exec(&self.db).await?;
        Ok(())
    }

    async fn categories_by_contributor(
        &self,
        contributor_id: &str,
    ) -> Result<Vec<Category>, AppError> {
        Ok(category::Entity::find()
            .filter(category::Column::ContributorId.eq(contributor_id))
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::from)
            .collect())
    }

    async fn categories_by_ids(&self, ids: &[String]) -> Result<Vec<Category>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(category::Entity::find()
            .filter(category::Column::Id.is_in(ids.iter().cloned()))
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::from)
            .collect())
    }
}
