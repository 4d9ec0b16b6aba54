use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};

use crate::authentication::{issue_token, revoke_token, verify_password_argon2, MaybeUser};
use crate::data_formats::{LoginRequest, TokenResponse};
use crate::db_helpers;
use crate::errors::RequestError;
use crate::AppState;

pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, RequestError> {
    let user = db_helpers::get_user_by_email(&state.pool, &request.email)
        .await?
        .ok_or(RequestError::BadRequest("bad credentials"))?;
    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    if !is_password_correct {
        return Err(RequestError::BadRequest("bad credentials"));
    }
    let auth_token = issue_token(&state.pool, user.id).await?;
    Ok(Json(TokenResponse { auth_token }))
}

pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    user: MaybeUser,
) -> Result<StatusCode, RequestError> {
    let user = user.require()?;
    revoke_token(&state.pool, &user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
