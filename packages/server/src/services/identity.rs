use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::UserRole;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, SqlErr,
};
use serde::Deserialize;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::user;
use crate::utils::time::month_start;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider does not vouch for the token.
    #[error("identity token rejected: {0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
}

/// Profile vouched for by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
}

/// Verifies ID tokens issued by an external provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    // tokeninfo encodes booleans as strings.
    email_verified: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

/// [`IdentityVerifier`] backed by Google's `tokeninfo` endpoint.
pub struct GoogleIdentityVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: String,
}

impl GoogleIdentityVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            tokeninfo_url: config.tokeninfo_url.clone(),
            client_id: config.google_client_id.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if response.status().is_client_error() {
            return Err(IdentityError::Rejected(format!(
                "provider answered {}",
                response.status()
            )));
        }
        let info: TokenInfo = response.error_for_status()?.json().await?;

        if info.aud != self.client_id {
            return Err(IdentityError::Rejected("audience mismatch".into()));
        }
        if info.email_verified.as_deref() != Some("true") {
            return Err(IdentityError::Rejected("email is not verified".into()));
        }
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IdentityError::Rejected("token carries no email".into()))?;

        Ok(VerifiedIdentity {
            email,
            first_name: info.given_name.unwrap_or_default(),
            last_name: info.family_name.unwrap_or_default(),
            picture: info.picture,
        })
    }
}

/// Outcome of signing a verified identity into the local user table.
#[derive(Debug)]
pub enum SignIn {
    Active(user::Model),
    /// The account exists but was deactivated.
    Deactivated,
}

/// Create the user on first sight, or refresh the profile of an existing one.
///
/// New users are regular users unless their email is listed in
/// `auth.admin_emails`; existing users keep their role.
pub async fn sign_in<C: ConnectionTrait>(
    conn: &C,
    config: &AuthConfig,
    identity: VerifiedIdentity,
) -> Result<SignIn, DbErr> {
    let email = identity.email.trim().to_lowercase();

    if let Some(existing) = find_by_email(conn, &email).await? {
        if existing.deleted {
            return Ok(SignIn::Deactivated);
        }
        let mut active = existing.into_active_model();
        active.first_name = Set(identity.first_name);
        active.last_name = Set(identity.last_name);
        active.picture = Set(identity.picture);
        return Ok(SignIn::Active(active.update(conn).await?));
    }

    let role = if config
        .admin_emails
        .iter()
        .any(|admin| admin.trim().eq_ignore_ascii_case(&email))
    {
        UserRole::Administrador
    } else {
        UserRole::UsuarioRegular
    };

    let new_user = user::ActiveModel {
        email: Set(email.clone()),
        first_name: Set(identity.first_name),
        last_name: Set(identity.last_name),
        picture: Set(identity.picture),
        role: Set(role),
        deleted: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_user.insert(conn).await {
        Ok(created) => {
            info!(user_id = created.id, role = %created.role, "Registered new user");
            Ok(SignIn::Active(created))
        }
        // Concurrent first sign-in of the same account.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            find_by_email(conn, &email)
                .await?
                .map(SignIn::Active)
                .ok_or(e)
        }
        Err(e) => Err(e),
    }
}

/// Accounts created since the start of the current month (UTC).
pub async fn registered_this_month<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    user::Entity::find()
        .filter(user::Column::CreatedAt.gte(month_start(Utc::now())))
        .count(conn)
        .await
}

async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(conn)
        .await
}
