use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{image_asset, supplier};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Image lookups always filter by owner and sort by position.
    create_index(
        db,
        "idx_image_asset_owner_position",
        Index::create()
            .if_not_exists()
            .name("idx_image_asset_owner_position")
            .table(image_asset::Entity)
            .col(image_asset::Column::OwnerKind)
            .col(image_asset::Column::OwnerId)
            .col(image_asset::Column::Position)
            .to_owned(),
    )
    .await;

    // Discovery: WHERE status = 'ACEPTADO' AND deleted = false
    create_index(
        db,
        "idx_supplier_status_deleted",
        Index::create()
            .if_not_exists()
            .name("idx_supplier_status_deleted")
            .table(supplier::Entity)
            .col(supplier::Column::Status)
            .col(supplier::Column::Deleted)
            .to_owned(),
    )
    .await;

    // Quota count: WHERE user_id = ? AND deleted = false
    create_index(
        db,
        "idx_supplier_user_deleted",
        Index::create()
            .if_not_exists()
            .name("idx_supplier_user_deleted")
            .table(supplier::Entity)
            .col(supplier::Column::UserId)
            .col(supplier::Column::Deleted)
            .to_owned(),
    )
    .await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    let sql = db.get_database_backend().build(&stmt).sql;
    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}
