use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier category. Its single image lives in `image_asset` with owner kind `category`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(has_many)]
    pub suppliers: HasMany<super::supplier::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
