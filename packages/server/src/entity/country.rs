use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "country")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(has_many)]
    pub provinces: HasMany<super::province::Entity>,

    #[sea_orm(has_many)]
    pub suppliers: HasMany<super::supplier::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
