use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Path,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Extension, Json,
};

use crate::authentication::{AuthUser, MaybeUser};
use crate::data_formats::{Page, RecipeListQuery, RecipeResponse, RecipeShortResponse};
use crate::db_helpers::{self, PinOutcome, Relation, CART, FAVORITE};
use crate::errors::{FieldError, RequestError};
use crate::images::store_image;
use crate::shopping_list;
use crate::validation::{validate_recipe_payload, IngredientAmount, RecipeCommand};
use crate::AppState;

pub async fn list_recipes(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    uri: Uri,
) -> Result<Json<Page<RecipeResponse>>, RequestError> {
    let query = RecipeListQuery::parse(uri.query().unwrap_or(""), state.config.page_size);
    let (count, rows) =
        db_helpers::list_recipes_in_db(&state.pool, viewer.get_id(), &query).await?;

    let recipe_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut tags_by_recipe: HashMap<i64, Vec<_>> = HashMap::new();
    for tag in db_helpers::get_tags_for_recipes(&state.pool, &recipe_ids).await? {
        tags_by_recipe.entry(tag.recipe_id).or_default().push(tag);
    }
    let mut ingredients_by_recipe: HashMap<i64, Vec<_>> = HashMap::new();
    for ingredient in db_helpers::get_ingredients_for_recipes(&state.pool, &recipe_ids).await? {
        ingredients_by_recipe
            .entry(ingredient.recipe_id)
            .or_default()
            .push(ingredient);
    }

    let results = rows
        .into_iter()
        .map(|row| {
            let tags = tags_by_recipe.remove(&row.id).unwrap_or_default();
            let ingredients = ingredients_by_recipe.remove(&row.id).unwrap_or_default();
            RecipeResponse::new(row, tags, ingredients)
        })
        .collect();
    Ok(Json(Page::new(
        "/api/recipes/",
        &query.retained_query(),
        query.page,
        query.limit,
        count,
        results,
    )))
}

pub async fn recipe_detail(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeResponse>, RequestError> {
    let response = build_recipe_response(&state, viewer.get_id(), id).await?;
    Ok(Json(response))
}

pub async fn create_recipe(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<RecipeResponse>), RequestError> {
    let actor = actor.require()?;
    let command = validate_recipe_payload(&payload, true)?;
    check_edges_exist(&state, &command).await?;

    // All fields are present after a require_all validation.
    let name = command.name.ok_or(RequestError::ServerError)?;
    let text = command.text.ok_or(RequestError::ServerError)?;
    let cooking_time = command.cooking_time.ok_or(RequestError::ServerError)?;
    let image = command.image.ok_or(RequestError::ServerError)?;
    let tags = command.tags.ok_or(RequestError::ServerError)?;
    let ingredients = command.ingredients.ok_or(RequestError::ServerError)?;

    if db_helpers::recipe_name_taken(&state.pool, actor.id, &name, None).await? {
        return Err(RequestError::validation(
            "name",
            "you already have a recipe with this name",
        ));
    }
    let image_key = store_image(&state.config.media_root, &image).await?;
    // The pre-check can race a concurrent identical submission; the
    // UNIQUE(author_id, name) violation from the insert maps to the
    // same 400 instead of surfacing as a 500.
    let recipe_id = db_helpers::create_recipe_in_db(
        &state.pool,
        actor.id,
        &name,
        &text,
        cooking_time,
        &image_key,
        &tags,
        &ingredients,
    )
    .await
    .map_err(map_duplicate_name)?;
    let response = build_recipe_response(&state, Some(actor.id), recipe_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn replace_recipe(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<RecipeResponse>, RequestError> {
    let actor = actor.require()?;
    apply_update(&state, &actor, id, &payload, true).await
}

pub async fn patch_recipe(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<RecipeResponse>, RequestError> {
    let actor = actor.require()?;
    apply_update(&state, &actor, id, &payload, false).await
}

pub async fn delete_recipe(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    let actor = actor.require()?;
    let author_id = db_helpers::get_recipe_author(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("recipe not found"))?;
    if author_id != actor.id && !actor.is_admin {
        return Err(RequestError::Forbidden);
    }
    db_helpers::delete_recipe_in_db(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Existence is checked before ownership, so an unknown recipe answers
/// 404 for everyone and 403 only leaks to the recipe's non-authors.
/// Admins may edit any recipe.
async fn apply_update(
    state: &Arc<AppState>,
    actor: &AuthUser,
    id: i64,
    payload: &serde_json::Value,
    require_all: bool,
) -> Result<Json<RecipeResponse>, RequestError> {
    let author_id = db_helpers::get_recipe_author(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("recipe not found"))?;
    if author_id != actor.id && !actor.is_admin {
        return Err(RequestError::Forbidden);
    }
    let command = validate_recipe_payload(payload, require_all)?;
    check_edges_exist(state, &command).await?;
    if let Some(name) = command.name.as_deref() {
        if db_helpers::recipe_name_taken(&state.pool, author_id, name, Some(id)).await? {
            return Err(RequestError::validation(
                "name",
                "you already have a recipe with this name",
            ));
        }
    }
    let image_key = match command.image.as_ref() {
        Some(image) => Some(store_image(&state.config.media_root, image).await?),
        None => None,
    };
    db_helpers::update_recipe_in_db(
        &state.pool,
        id,
        command.name.as_deref(),
        command.text.as_deref(),
        command.cooking_time,
        image_key.as_deref(),
        command.tags.as_deref(),
        command.ingredients.as_deref(),
    )
    .await
    .map_err(map_duplicate_name)?;
    let response = build_recipe_response(state, Some(actor.id), id).await?;
    Ok(Json(response))
}

fn map_duplicate_name(e: RequestError) -> RequestError {
    if e.is_unique_violation("recipes.name") {
        RequestError::validation("name", "you already have a recipe with this name")
    } else {
        e
    }
}

/// Rejects ids that do not reference a stored tag or ingredient, with
/// one error per unknown id.
async fn check_edges_exist(
    state: &Arc<AppState>,
    command: &RecipeCommand,
) -> Result<(), RequestError> {
    let mut errors = Vec::new();
    if let Some(tags) = command.tags.as_deref() {
        for id in db_helpers::find_missing_tags(&state.pool, tags).await? {
            errors.push(FieldError::new("tags", format!("unknown tag id {id}")));
        }
    }
    if let Some(ingredients) = command.ingredients.as_deref() {
        let ids: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
        for id in db_helpers::find_missing_ingredients(&state.pool, &ids).await? {
            errors.push(FieldError::new(
                "ingredients",
                format!("unknown ingredient id {id}"),
            ));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RequestError::Validation(errors))
    }
}

async fn build_recipe_response(
    state: &Arc<AppState>,
    viewer: Option<i64>,
    id: i64,
) -> Result<RecipeResponse, RequestError> {
    let row = db_helpers::get_recipe_row(&state.pool, viewer, id)
        .await?
        .ok_or(RequestError::NotFound("recipe not found"))?;
    let tags = db_helpers::get_tags_for_recipes(&state.pool, &[id]).await?;
    let ingredients = db_helpers::get_ingredients_for_recipes(&state.pool, &[id]).await?;
    Ok(RecipeResponse::new(row, tags, ingredients))
}

// ----------------- Favorite and Cart Handlers -----------------

pub async fn add_favorite(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeShortResponse>), RequestError> {
    pin_recipe(&state, actor, id, &FAVORITE).await
}

pub async fn remove_favorite(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    unpin_recipe(&state, actor, id, &FAVORITE).await
}

pub async fn add_to_cart(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeShortResponse>), RequestError> {
    pin_recipe(&state, actor, id, &CART).await
}

pub async fn remove_from_cart(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    unpin_recipe(&state, actor, id, &CART).await
}

async fn pin_recipe(
    state: &Arc<AppState>,
    actor: MaybeUser,
    id: i64,
    relation: &Relation,
) -> Result<(StatusCode, Json<RecipeShortResponse>), RequestError> {
    let actor = actor.require()?;
    let recipe = db_helpers::get_recipe_short(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("recipe not found"))?;
    match db_helpers::pin(&state.pool, relation, actor.id, id).await? {
        PinOutcome::Created => {}
        PinOutcome::Duplicate => return Err(RequestError::BadRequest("already added")),
    }
    Ok((StatusCode::CREATED, Json(RecipeShortResponse::from(recipe))))
}

async fn unpin_recipe(
    state: &Arc<AppState>,
    actor: MaybeUser,
    id: i64,
    relation: &Relation,
) -> Result<StatusCode, RequestError> {
    let actor = actor.require()?;
    if db_helpers::get_recipe_short(&state.pool, id).await?.is_none() {
        return Err(RequestError::NotFound("recipe not found"));
    }
    if !db_helpers::unpin(&state.pool, relation, actor.id, id).await? {
        return Err(RequestError::NotFound("not present"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
) -> Result<impl IntoResponse, RequestError> {
    let actor = actor.require()?;
    let items = db_helpers::get_cart_items(&state.pool, actor.id).await?;
    let report = shopping_list::render(&shopping_list::aggregate(items));
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=shopping_list.txt",
            ),
        ],
        report,
    ))
}
