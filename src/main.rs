use std::sync::Arc;

use foodgram::{init_db, make_router, run_app, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let pool = init_db(&config.database_url).await?;
    if let Some(path) = config.ingredients_csv.as_deref() {
        let imported = foodgram::seed::import_ingredients(&pool, path).await?;
        tracing::info!("imported {imported} ingredients from {}", path.display());
    }

    let addr = config.bind_addr;
    let state = Arc::new(AppState { pool, config });
    let router = make_router();
    tracing::info!("Server started on {addr}");
    run_app(router, addr, state).await
}
