use axum::http::{StatusCode, Uri};

mod auth;
mod ingredients;
mod recipes;
mod tags;
mod users;

pub use auth::*;
pub use ingredients::*;
pub use recipes::*;
pub use tags::*;
pub use users::*;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}
