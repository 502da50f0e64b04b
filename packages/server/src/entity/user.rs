use common::UserRole;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Identity subject; session tokens carry it as `sub`.
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,

    pub role: UserRole,
    pub deleted: bool,

    #[sea_orm(has_many)]
    pub suppliers: HasMany<super::supplier::Entity>,

    #[sea_orm(has_many)]
    pub publications: HasMany<super::publication::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
