use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_asset")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owner entity kind ("supplier", "publication", "category").
    pub owner_kind: String,

    pub owner_id: i32,

    /// Object name inside the owner kind's storage folder.
    #[sea_orm(unique)]
    pub name: String,

    /// Public URL returned by the object store.
    pub path: String,

    /// Order within the owner, starting at 0.
    pub position: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
