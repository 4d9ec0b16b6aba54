use sqlx::{Sqlite, SqlitePool};

use super::placeholders;
use crate::errors::RequestError;
use crate::models::{Ingredient, RecipeIngredientRow};
use crate::validation::IngredientCommand;

/// Alphabetical ingredient listing, optionally narrowed by a
/// case-insensitive name prefix. ASCII prefixes narrow in SQL with
/// LIKE; SQLite's LIKE and lower() only fold ASCII case, so other
/// prefixes fetch the table and match here.
pub async fn list_ingredients(
    pool: &SqlitePool,
    prefix: Option<&str>,
) -> Result<Vec<Ingredient>, RequestError> {
    let prefix = prefix.filter(|prefix| !prefix.is_empty());
    let ingredients = match prefix {
        Some(prefix) if prefix.is_ascii() => {
            sqlx::query_as::<Sqlite, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients \
                 WHERE name LIKE $1 ESCAPE '\\' ORDER BY name",
            )
            .bind(format!("{}%", like_escape(prefix)))
            .fetch_all(pool)
            .await?
        }
        _ => {
            sqlx::query_as::<Sqlite, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients ORDER BY name",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(match prefix {
        Some(prefix) => {
            let prefix = prefix.to_lowercase();
            ingredients
                .into_iter()
                .filter(|ingredient| ingredient.name.to_lowercase().starts_with(&prefix))
                .collect()
        }
        None => ingredients,
    })
}

fn like_escape(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub async fn get_ingredient(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Ingredient>, RequestError> {
    let ingredient = sqlx::query_as::<Sqlite, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(ingredient)
}

pub async fn insert_ingredient(
    pool: &SqlitePool,
    command: &IngredientCommand,
) -> Result<Ingredient, RequestError> {
    let ingredient = sqlx::query_as::<Sqlite, Ingredient>(
        r#"
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        RETURNING id, name, measurement_unit
        "#,
    )
    .bind(&command.name)
    .bind(&command.measurement_unit)
    .fetch_one(pool)
    .await?;
    Ok(ingredient)
}

/// Returns the subset of `ids` that does not reference an existing
/// ingredient.
pub async fn find_missing_ingredients(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<i64>, RequestError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id FROM ingredients WHERE id IN {}",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_scalar::<Sqlite, i64>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let found = query.fetch_all(pool).await?;
    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

/// Ingredient edges of the given recipes in one query.
pub async fn get_ingredients_for_recipes(
    pool: &SqlitePool,
    recipe_ids: &[i64],
) -> Result<Vec<RecipeIngredientRow>, RequestError> {
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"
        SELECT recipe_ingredients.recipe_id,
               ingredients.id,
               ingredients.name,
               ingredients.measurement_unit,
               recipe_ingredients.amount
        FROM recipe_ingredients
        JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE recipe_ingredients.recipe_id IN {}
        ORDER BY ingredients.name
        "#,
        placeholders(recipe_ids.len())
    );
    let mut query = sqlx::query_as::<Sqlite, RecipeIngredientRow>(&sql);
    for id in recipe_ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::like_escape;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(like_escape("plain"), "plain");
        assert_eq!(like_escape("50%_a\\b"), "50\\%\\_a\\\\b");
    }
}
