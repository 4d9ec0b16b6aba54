use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::UserRow;
use crate::validation::RegisterCommand;

const USER_ROW_QUERY: &str = r#"
    SELECT users.id,
           users.username,
           users.email,
           users.first_name,
           users.last_name,
           EXISTS (SELECT 1
                   FROM subscriptions
                   WHERE subscriptions.subscriber_id = $1
                     AND subscriptions.author_id = users.id) AS is_subscribed
    FROM users
"#;

pub async fn insert_user(
    pool: &SqlitePool,
    command: &RegisterCommand,
    password_hash: &str,
) -> Result<i64, RequestError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&command.email)
    .bind(&command.username)
    .bind(&command.first_name)
    .bind(&command.last_name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64, RequestError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn list_users(
    pool: &SqlitePool,
    viewer: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<UserRow>, RequestError> {
    let sql = format!("{USER_ROW_QUERY} ORDER BY users.username LIMIT $2 OFFSET $3");
    let rows = sqlx::query_as::<Sqlite, UserRow>(&sql)
        .bind(viewer)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_user_row(
    pool: &SqlitePool,
    viewer: Option<i64>,
    id: i64,
) -> Result<Option<UserRow>, RequestError> {
    let sql = format!("{USER_ROW_QUERY} WHERE users.id = $2");
    let row = sqlx::query_as::<Sqlite, UserRow>(&sql)
        .bind(viewer)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
