use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension, Json};

use crate::authentication::MaybeUser;
use crate::data_formats::{TagPayload, TagResponse};
use crate::db_helpers;
use crate::errors::RequestError;
use crate::validation::validate_tag_payload;
use crate::AppState;

pub async fn list_tags(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<TagResponse>>, RequestError> {
    let tags = db_helpers::list_tags(&state.pool).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

pub async fn tag_detail(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TagResponse>, RequestError> {
    let tag = db_helpers::get_tag(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("tag not found"))?;
    Ok(Json(TagResponse::from(tag)))
}

pub async fn create_tag(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Json(payload): Json<TagPayload>,
) -> Result<(StatusCode, Json<TagResponse>), RequestError> {
    let actor = actor.require()?;
    if !actor.is_admin {
        return Err(RequestError::Forbidden);
    }
    let command = validate_tag_payload(&payload)?;
    let tag = db_helpers::insert_tag(&state.pool, &command)
        .await
        .map_err(|e| {
            if e.is_unique_violation("tags.name") {
                RequestError::validation("name", "a tag with this name already exists")
            } else if e.is_unique_violation("tags.slug") {
                RequestError::validation("slug", "a tag with this slug already exists")
            } else if e.is_unique_violation("tags.color") {
                RequestError::validation("color", "a tag with this color already exists")
            } else {
                e
            }
        })?;
    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}
