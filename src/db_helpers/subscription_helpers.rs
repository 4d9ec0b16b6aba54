use sqlx::{Sqlite, SqlitePool};

use super::placeholders;
use crate::errors::RequestError;
use crate::models::{AuthorRecipeRow, AuthorRow, RecipeShortRow};

const AUTHOR_QUERY: &str = r#"
    SELECT users.id,
           users.username,
           users.email,
           users.first_name,
           users.last_name,
           (SELECT COUNT(*) FROM recipes
            WHERE recipes.author_id = users.id) AS recipes_count
    FROM users
"#;

pub async fn count_subscriptions(pool: &SqlitePool, user_id: i64) -> Result<i64, RequestError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// One page of authors the user subscribes to, alphabetically.
pub async fn list_subscribed_authors(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuthorRow>, RequestError> {
    let sql = format!(
        "{AUTHOR_QUERY} \
         JOIN subscriptions ON subscriptions.author_id = users.id \
         WHERE subscriptions.subscriber_id = $1 \
         ORDER BY users.username LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query_as::<Sqlite, AuthorRow>(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Author projection with recipe count, for the subscribe response.
pub async fn get_author_row(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<Option<AuthorRow>, RequestError> {
    let sql = format!("{AUTHOR_QUERY} WHERE users.id = $1");
    let row = sqlx::query_as::<Sqlite, AuthorRow>(&sql)
        .bind(author_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_recipes_for_author(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<Vec<RecipeShortRow>, RequestError> {
    let rows = sqlx::query_as::<Sqlite, RecipeShortRow>(
        r#"
        SELECT id, name, image, cooking_time FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC, id DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Compact recipes of several authors in one query, for the
/// subscriptions listing.
pub async fn get_recipes_for_authors(
    pool: &SqlitePool,
    author_ids: &[i64],
) -> Result<Vec<AuthorRecipeRow>, RequestError> {
    if author_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"
        SELECT author_id, id, name, image, cooking_time FROM recipes
        WHERE author_id IN {}
        ORDER BY pub_date DESC, id DESC
        "#,
        placeholders(author_ids.len())
    );
    let mut query = sqlx::query_as::<Sqlite, AuthorRecipeRow>(&sql);
    for id in author_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}
