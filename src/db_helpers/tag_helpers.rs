use sqlx::{Sqlite, SqlitePool};

use super::placeholders;
use crate::errors::RequestError;
use crate::models::{RecipeTagRow, Tag};
use crate::validation::TagCommand;

pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let tags = sqlx::query_as::<Sqlite, Tag>(
        "SELECT id, name, slug, color FROM tags ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

pub async fn get_tag(pool: &SqlitePool, id: i64) -> Result<Option<Tag>, RequestError> {
    let tag = sqlx::query_as::<Sqlite, Tag>(
        "SELECT id, name, slug, color FROM tags WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(tag)
}

pub async fn insert_tag(pool: &SqlitePool, command: &TagCommand) -> Result<Tag, RequestError> {
    let tag = sqlx::query_as::<Sqlite, Tag>(
        r#"
        INSERT INTO tags (name, slug, color)
        VALUES ($1, $2, $3)
        RETURNING id, name, slug, color
        "#,
    )
    .bind(&command.name)
    .bind(&command.slug)
    .bind(&command.color)
    .fetch_one(pool)
    .await?;
    Ok(tag)
}

/// Returns the subset of `ids` that does not reference an existing tag.
pub async fn find_missing_tags(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<i64>, RequestError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("SELECT id FROM tags WHERE id IN {}", placeholders(ids.len()));
    let mut query = sqlx::query_scalar::<Sqlite, i64>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let found = query.fetch_all(pool).await?;
    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

/// Tag edges of the given recipes in one query, for batched projection.
pub async fn get_tags_for_recipes(
    pool: &SqlitePool,
    recipe_ids: &[i64],
) -> Result<Vec<RecipeTagRow>, RequestError> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"
        SELECT recipe_tags.recipe_id, tags.id, tags.name, tags.slug, tags.color
        FROM recipe_tags
        JOIN tags ON tags.id = recipe_tags.tag_id
        WHERE recipe_tags.recipe_id IN {}
        ORDER BY tags.name
        "#,
        placeholders(recipe_ids.len())
    );
    let mut query = sqlx::query_as::<Sqlite, RecipeTagRow>(&sql);
    for id in recipe_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}
