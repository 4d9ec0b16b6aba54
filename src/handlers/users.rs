use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Path,
    http::{StatusCode, Uri},
    Extension, Json,
};

use crate::authentication::{hash_password_argon2, MaybeUser};
use crate::data_formats::{
    Page, PageQuery, RegisterRequest, RegisterResponse, RecipeShortResponse, SubscriptionResponse,
    UserResponse,
};
use crate::db_helpers::{self, PinOutcome, SUBSCRIPTION};
use crate::errors::RequestError;
use crate::validation::validate_register;
use crate::AppState;

pub async fn register_user(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), RequestError> {
    let command = validate_register(&request)?;
    let password_hash = hash_password_argon2(command.password.clone())
        .await
        .map_err(|_| RequestError::ServerError)?;
    let id = db_helpers::insert_user(&state.pool, &command, &password_hash)
        .await
        .map_err(|e| {
            if e.is_unique_violation("users.email") {
                RequestError::validation("email", "a user with this email already exists")
            } else if e.is_unique_violation("users.username") {
                RequestError::validation("username", "a user with this username already exists")
            } else {
                e
            }
        })?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id,
            email: command.email,
            username: command.username,
            first_name: command.first_name,
            last_name: command.last_name,
        }),
    ))
}

pub async fn list_users(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    uri: Uri,
) -> Result<Json<Page<UserResponse>>, RequestError> {
    let query = PageQuery::parse(uri.query().unwrap_or(""), state.config.page_size);
    let count = db_helpers::count_users(&state.pool).await?;
    let rows = db_helpers::list_users(
        &state.pool,
        viewer.get_id(),
        i64::from(query.limit),
        query.offset(),
    )
    .await?;
    let results = rows.into_iter().map(UserResponse::from).collect();
    Ok(Json(Page::new(
        "/api/users/",
        &query.retained_query(),
        query.page,
        query.limit,
        count,
        results,
    )))
}

pub async fn user_detail(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, RequestError> {
    let row = db_helpers::get_user_row(&state.pool, viewer.get_id(), id)
        .await?
        .ok_or(RequestError::NotFound("user not found"))?;
    Ok(Json(UserResponse::from(row)))
}

pub async fn current_user(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
) -> Result<Json<UserResponse>, RequestError> {
    let user = viewer.require()?;
    let row = db_helpers::get_user_row(&state.pool, Some(user.id), user.id)
        .await?
        .ok_or(RequestError::NotFound("user not found"))?;
    Ok(Json(UserResponse::from(row)))
}

// ----------------- Subscription Handlers -----------------

pub async fn subscribe(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), RequestError> {
    let actor = actor.require()?;
    let author = db_helpers::get_author_row(&state.pool, id)
        .await?
        .ok_or(RequestError::NotFound("user not found"))?;
    if actor.id == id {
        return Err(RequestError::BadRequest("cannot subscribe to self"));
    }
    match db_helpers::pin(&state.pool, &SUBSCRIPTION, actor.id, id).await? {
        PinOutcome::Created => {}
        PinOutcome::Duplicate => return Err(RequestError::BadRequest("already added")),
    }
    let recipes = db_helpers::get_recipes_for_author(&state.pool, id)
        .await?
        .into_iter()
        .map(RecipeShortResponse::from)
        .collect();
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::new(author, recipes)),
    ))
}

pub async fn unsubscribe(
    Extension(state): Extension<Arc<AppState>>,
    actor: MaybeUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    let actor = actor.require()?;
    if db_helpers::get_user_by_id(&state.pool, id).await?.is_none() {
        return Err(RequestError::NotFound("user not found"));
    }
    if !db_helpers::unpin(&state.pool, &SUBSCRIPTION, actor.id, id).await? {
        return Err(RequestError::NotFound("not present"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_subscriptions(
    Extension(state): Extension<Arc<AppState>>,
    viewer: MaybeUser,
    uri: Uri,
) -> Result<Json<Page<SubscriptionResponse>>, RequestError> {
    let user = viewer.require()?;
    let query = PageQuery::parse(uri.query().unwrap_or(""), state.config.page_size);
    let count = db_helpers::count_subscriptions(&state.pool, user.id).await?;
    let authors = db_helpers::list_subscribed_authors(
        &state.pool,
        user.id,
        i64::from(query.limit),
        query.offset(),
    )
    .await?;

    let author_ids: Vec<i64> = authors.iter().map(|author| author.id).collect();
    let mut recipes_by_author: HashMap<i64, Vec<RecipeShortResponse>> = HashMap::new();
    for recipe in db_helpers::get_recipes_for_authors(&state.pool, &author_ids).await? {
        recipes_by_author
            .entry(recipe.author_id)
            .or_default()
            .push(RecipeShortResponse {
                id: recipe.id,
                name: recipe.name,
                image: crate::images::media_url(&recipe.image),
                cooking_time: recipe.cooking_time,
            });
    }

    let results = authors
        .into_iter()
        .map(|author| {
            let recipes = recipes_by_author.remove(&author.id).unwrap_or_default();
            SubscriptionResponse::new(author, recipes)
        })
        .collect();
    Ok(Json(Page::new(
        "/api/users/subscriptions/",
        &query.retained_query(),
        query.page,
        query.limit,
        count,
        results,
    )))
}
