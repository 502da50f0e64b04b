use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "province")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Matched against the geocoder's first-level administrative area.
    pub name: String,

    pub country_id: i32,
    #[sea_orm(belongs_to, from = "country_id", to = "id")]
    pub country: HasOne<super::country::Entity>,

    #[sea_orm(has_many)]
    pub suppliers: HasMany<super::supplier::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
