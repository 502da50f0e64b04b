#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by every user and embedded in session tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ADMINISTRADOR"))]
    Administrador,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "USUARIO_REGULAR"))]
    UsuarioRegular,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrador => "ADMINISTRADOR",
            Self::UsuarioRegular => "USUARIO_REGULAR",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::UsuarioRegular
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMINISTRADOR" => Ok(Self::Administrador),
            "USUARIO_REGULAR" => Ok(Self::UsuarioRegular),
            other => Err(format!("Invalid role '{other}'")),
        }
    }
}
