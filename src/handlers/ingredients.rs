use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};

use crate::authentication::MaybeUser;
use crate::data_formats::{IngredientPayload, IngredientQuery, IngredientResponse};
use crate::db_helpers;
use crate::errors::RequestError;
use crate::validation::validate_ingredient_payload;
use crate::AppState;

pub async fn list_ingredients(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<IngredientResponse>>, RequestError> {
    let ingredients = db_helpers::list_ingredients(&state.pool, query.name.as_deref()).await?;
    Ok(Json(
        ingredients
            .into_iter()
            .map(IngredientResponse::from)
            .collect(),
    ))
}

pub async fn ingredient_detail(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<IngredientResponse>, RequestError> {
    let ingredient = db_helpers::get_ingredient(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("ingredient not found"))?;
    Ok(Json(IngredientResponse::from(ingredient)))
}

pub async fn create_ingredient(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Json(payload): Json<IngredientPayload>,
) -> Result<(StatusCode, Json<IngredientResponse>), RequestError> {
    let actor = actor.require()?;
    if !actor.is_admin {
        return Err(RequestError::Forbidden);
    }
    let command = validate_ingredient_payload(&payload)?;
    let ingredient = db_helpers::insert_ingredient(&state.pool, &command).await?;
    Ok((StatusCode::CREATED, Json(IngredientResponse::from(ingredient))))
}
