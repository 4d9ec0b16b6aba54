use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::RngCore;
use sqlx::SqlitePool;

use crate::errors::RequestError;
use crate::AppState;

const TOKEN_BYTES: usize = 20;

/// An authenticated principal resolved from the Authorization header.
pub struct AuthUser {
    pub id: i64,
    pub is_admin: bool,
    pub token: String,
}

/// Either an authenticated user or the anonymous principal. An absent,
/// malformed or unknown token resolves to anonymous rather than an
/// error; endpoints that need authentication reject the `None` case.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }

    pub fn require(self) -> Result<AuthUser, RequestError> {
        self.0
            .ok_or(RequestError::NotAuthorized("authentication required"))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<Arc<AppState>>()
            .ok_or(RequestError::ServerError)?
            .clone();
        let header = match parts.headers.get("Authorization") {
            Some(header) => header,
            None => return Ok(MaybeUser(None)),
        };
        let token = header
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix("Token "));
        let token = match token {
            Some(token) => token,
            None => return Ok(MaybeUser(None)),
        };
        let user = resolve_token(&state.pool, token).await?;
        Ok(MaybeUser(user))
    }
}

/// Creates and stores a fresh opaque token for the user.
pub async fn issue_token(pool: &SqlitePool, user_id: i64) -> Result<String, RequestError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    sqlx::query("INSERT INTO authtokens (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Invalidates a token. Returns whether it existed.
pub async fn revoke_token(pool: &SqlitePool, token: &str) -> Result<bool, RequestError> {
    let result = sqlx::query("DELETE FROM authtokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn resolve_token(pool: &SqlitePool, token: &str) -> Result<Option<AuthUser>, RequestError> {
    let row: Option<(i64, bool)> = sqlx::query_as(
        r#"
        SELECT users.id, users.is_admin
        FROM authtokens JOIN users ON users.id = authtokens.user_id
        WHERE authtokens.token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, is_admin)| AuthUser {
        id,
        is_admin,
        token: token.to_string(),
    }))
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_roundtrip() {
        let hash = hash_password_argon2("pw12345!".to_string()).await.unwrap();
        assert!(verify_password_argon2("pw12345!".to_string(), &hash)
            .await
            .unwrap());
        assert!(!verify_password_argon2("wrong".to_string(), &hash)
            .await
            .unwrap());
    }
}
