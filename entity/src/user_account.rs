use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// The password in hashed PHC form
    pub password: String,
    pub is_admin: bool,
    pub contributed_pois: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::point_of_interest::Entity")]
    PointOfInterest,
    #[sea_orm(has_many = "super::category::Entity")]
    Category,
}

impl Related<super::point_of_interest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PointOfInterest.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
