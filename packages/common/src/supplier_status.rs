#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review status of a supplier listing.
///
/// Every status is reachable from every other one: owner edits always go back to
/// `RevisionInicial`, and administrators may assign any value through review.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierStatus {
    /// Submitted or edited by its owner, waiting for an administrator.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REVISION_INICIAL"))]
    RevisionInicial,
    /// Approved; the only status visible to discovery.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ACEPTADO"))]
    Aceptado,
    /// Rejected by an administrator.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DENEGADO"))]
    Denegado,
    /// An administrator asked the owner for modifications.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REQUIERE_CAMBIOS"))]
    RequiereCambios,
    /// An administrator recorded that requested modifications were made.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CAMBIOS_REALIZADOS"))]
    CambiosRealizados,
}

impl SupplierStatus {
    /// Feedback attached whenever a listing (re)enters `RevisionInicial`.
    pub const INITIAL_FEEDBACK: &'static str = "Revisión inicial";

    /// All possible status values.
    pub const ALL: &'static [SupplierStatus] = &[
        Self::RevisionInicial,
        Self::Aceptado,
        Self::Denegado,
        Self::RequiereCambios,
        Self::CambiosRealizados,
    ];

    /// Returns true if listings in this status are publicly discoverable.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Aceptado)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RevisionInicial => "REVISION_INICIAL",
            Self::Aceptado => "ACEPTADO",
            Self::Denegado => "DENEGADO",
            Self::RequiereCambios => "REQUIERE_CAMBIOS",
            Self::CambiosRealizados => "CAMBIOS_REALIZADOS",
        }
    }
}

impl fmt::Display for SupplierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SupplierStatus {
    fn default() -> Self {
        Self::RevisionInicial
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            SupplierStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SupplierStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}
