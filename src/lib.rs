mod authentication;
mod color;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod images;
mod models;
pub mod seed;
mod shopping_list;
mod validation;

use anyhow::Context;
pub use anyhow::Result;
use axum::{routing::*, Extension, Router};
pub use config::Config;
use handlers::*;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::{
    net::{SocketAddr, TcpListener},
    str::FromStr,
    sync::Arc,
};

/// Shared server state: the connection pool plus the startup
/// configuration.
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

pub async fn run_app(app: Router, address: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = app.layer(Extension(state));
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .context("DATABASE_URL is not a sqlite URL")?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to connect to the database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        .route("/api/auth/token/login/", post(login))
        .route("/api/auth/token/logout/", post(logout))
        .route("/api/users/", get(list_users).post(register_user))
        // Static segments first; the router prefers them over :id.
        .route("/api/users/me/", get(current_user))
        .route("/api/users/subscriptions/", get(my_subscriptions))
        .route("/api/users/:id/", get(user_detail))
        .route(
            "/api/users/:id/subscribe/",
            post(subscribe).delete(unsubscribe),
        )
        .route("/api/tags/", get(list_tags).post(create_tag))
        .route("/api/tags/:id/", get(tag_detail))
        .route(
            "/api/ingredients/",
            get(list_ingredients).post(create_ingredient),
        )
        .route("/api/ingredients/:id/", get(ingredient_detail))
        .route("/api/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/api/recipes/:id/",
            get(recipe_detail)
                .put(replace_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/api/recipes/:id/favorite/",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/api/recipes/:id/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
        .fallback(not_found)
}
