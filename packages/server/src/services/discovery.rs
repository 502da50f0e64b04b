//! Read side of the directory. Every query here only ever returns listings that
//! are `ACEPTADO` and not soft-deleted.

use common::SupplierStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery, SelectStatement, SimpleExpr};
use sea_orm::*;
use tracing::debug;

use crate::entity::{category, country, province, supplier};
use crate::error::AppError;
use crate::models::shared::escape_like;
use crate::services::location::{self, GeoFilter, Geocoder};

fn accepted() -> Select<supplier::Entity> {
    supplier::Entity::find()
        .filter(supplier::Column::Status.eq(SupplierStatus::Aceptado))
        .filter(supplier::Column::Deleted.eq(false))
        .order_by_asc(supplier::Column::Id)
}

fn lower_eq<C: ColumnTrait>(column: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

fn lower_contains<C: ColumnTrait>(column: C, value: &str) -> SimpleExpr {
    let term = escape_like(value.trim());
    Expr::expr(Func::lower(Expr::col(column)))
        .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\'))
}

pub async fn list_accepted<C: ConnectionTrait>(conn: &C) -> Result<Vec<supplier::Model>, DbErr> {
    accepted().all(conn).await
}

/// `(id, name)` of every accepted listing.
pub async fn accepted_names<C: ConnectionTrait>(conn: &C) -> Result<Vec<(i32, String)>, DbErr> {
    accepted()
        .select_only()
        .column(supplier::Column::Id)
        .column(supplier::Column::Name)
        .into_tuple()
        .all(conn)
        .await
}

/// Case-insensitive substring search on the listing name.
pub async fn search_by_name<C: ConnectionTrait>(
    conn: &C,
    query: &str,
) -> Result<Vec<supplier::Model>, AppError> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidQuery("The query cannot be empty".into()));
    }

    let found = accepted()
        .filter(lower_contains(supplier::Column::Name, query))
        .all(conn)
        .await?;
    if found.is_empty() {
        return Err(AppError::NotFound(format!(
            "No supplier found with name '{}'",
            query.trim()
        )));
    }
    Ok(found)
}

/// Resolve a category by name: exact case-insensitive match first, then the
/// lowest-id category whose name contains `name`.
pub async fn resolve_category<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<category::Model>, DbErr> {
    if name.trim().is_empty() {
        return Ok(None);
    }

    let exact = category::Entity::find()
        .filter(lower_eq(category::Column::Name, name))
        .order_by_asc(category::Column::Id)
        .one(conn)
        .await?;
    if exact.is_some() {
        return Ok(exact);
    }

    category::Entity::find()
        .filter(lower_contains(category::Column::Name, name))
        .order_by_asc(category::Column::Id)
        .one(conn)
        .await
}

pub async fn search_by_category<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Vec<supplier::Model>, AppError> {
    let category = resolve_category(conn, name)
        .await?
        .ok_or_else(|| AppError::InvalidQuery(format!("Category '{}' does not exist", name.trim())))?;

    let found = accepted()
        .filter(supplier::Column::CategoryId.eq(category.id))
        .all(conn)
        .await?;
    if found.is_empty() {
        return Err(AppError::NotFound(format!(
            "No supplier found in category '{}'",
            category.name
        )));
    }
    Ok(found)
}

fn country_ids(name: &str) -> SelectStatement {
    SeaQuery::select()
        .column(country::Column::Id)
        .from(country::Entity)
        .and_where(lower_eq(country::Column::Name, name))
        .to_owned()
}

fn province_ids(name: &str) -> SelectStatement {
    SeaQuery::select()
        .column(province::Column::Id)
        .from(province::Entity)
        .and_where(lower_eq(province::Column::Name, name))
        .to_owned()
}

/// Accepted listings matching one tier of a [`GeoFilter`].
pub async fn in_place<C: ConnectionTrait>(
    conn: &C,
    place: &GeoFilter,
) -> Result<Vec<supplier::Model>, DbErr> {
    let mut select = accepted().filter(supplier::Column::CountryId.in_subquery(country_ids(&place.country)));
    if let Some(province) = &place.province {
        select = select.filter(supplier::Column::ProvinceId.in_subquery(province_ids(province)));
    }
    if let Some(city) = &place.city {
        select = select.filter(lower_eq(supplier::Column::City, city));
    }
    select.all(conn).await
}

/// Listings near the coordinates, widening city, then province, then country
/// until a tier matches. An empty result is not an error.
pub async fn search_by_location<C: ConnectionTrait>(
    conn: &C,
    geocoder: &dyn Geocoder,
    lat: f64,
    lng: f64,
) -> Result<Vec<supplier::Model>, AppError> {
    let filter = location::resolve(geocoder, lat, lng).await?;

    for tier in filter.tiers() {
        let found = in_place(conn, &tier).await?;
        if !found.is_empty() {
            debug!(?tier, count = found.len(), "Location search matched");
            return Ok(found);
        }
    }
    Ok(Vec::new())
}
