use sqlx::query::{QueryAs, QueryScalar};
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};

use super::placeholders;
use crate::data_formats::RecipeListQuery;
use crate::errors::RequestError;
use crate::models::{CartItemRow, RecipeRow, RecipeShortRow};
use crate::validation::IngredientAmount;

/// Viewer-scoped recipe projection. The three leading binds are the
/// viewer id (NULL for anonymous, which makes every EXISTS false).
const RECIPE_QUERY: &str = r#"
    SELECT recipes.id,
           recipes.name,
           recipes.text,
           recipes.image,
           recipes.cooking_time,
           recipes.pub_date,
           users.id                                       AS author_id,
           users.username                                 AS author_username,
           users.email                                    AS author_email,
           users.first_name                               AS author_first_name,
           users.last_name                                AS author_last_name,
           EXISTS (SELECT 1
                   FROM subscriptions
                   WHERE subscriptions.subscriber_id = ?
                     AND subscriptions.author_id = users.id)   AS is_subscribed,
           EXISTS (SELECT 1
                   FROM favorites
                   WHERE favorites.user_id = ?
                     AND favorites.recipe_id = recipes.id)     AS is_favorited,
           EXISTS (SELECT 1
                   FROM cart_entries
                   WHERE cart_entries.user_id = ?
                     AND cart_entries.recipe_id = recipes.id)  AS is_in_shopping_cart
    FROM recipes
    JOIN users ON users.id = recipes.author_id
    WHERE 1 = 1
"#;

enum Arg {
    Int(i64),
    Bool(bool),
    Text(String),
}

fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    args: &'q [Arg],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            Arg::Int(value) => query.bind(*value),
            Arg::Bool(value) => query.bind(*value),
            Arg::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    args: &'q [Arg],
) -> QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            Arg::Int(value) => query.bind(*value),
            Arg::Bool(value) => query.bind(*value),
            Arg::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

/// WHERE clauses and bind values for the list filters. Boolean filters
/// are silently dropped for anonymous viewers.
fn recipe_filters(query: &RecipeListQuery, viewer: Option<i64>) -> (String, Vec<Arg>) {
    let mut clauses = String::new();
    let mut args = Vec::new();
    if let Some(author) = query.author {
        clauses.push_str(" AND recipes.author_id = ?");
        args.push(Arg::Int(author));
    }
    if !query.tags.is_empty() {
        clauses.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM recipe_tags \
             JOIN tags ON tags.id = recipe_tags.tag_id \
             WHERE recipe_tags.recipe_id = recipes.id AND tags.slug IN {})",
            placeholders(query.tags.len())
        ));
        for slug in &query.tags {
            args.push(Arg::Text(slug.clone()));
        }
    }
    if let Some(viewer) = viewer {
        if let Some(flag) = query.is_favorited {
            clauses.push_str(
                " AND EXISTS (SELECT 1 FROM favorites \
                 WHERE favorites.user_id = ? AND favorites.recipe_id = recipes.id) = ?",
            );
            args.push(Arg::Int(viewer));
            args.push(Arg::Bool(flag));
        }
        if let Some(flag) = query.is_in_shopping_cart {
            clauses.push_str(
                " AND EXISTS (SELECT 1 FROM cart_entries \
                 WHERE cart_entries.user_id = ? AND cart_entries.recipe_id = recipes.id) = ?",
            );
            args.push(Arg::Int(viewer));
            args.push(Arg::Bool(flag));
        }
    }
    (clauses, args)
}

/// Filtered, newest-first page of recipes plus the unpaginated total.
pub async fn list_recipes_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    query: &RecipeListQuery,
) -> Result<(i64, Vec<RecipeRow>), RequestError> {
    let (clauses, args) = recipe_filters(query, viewer);

    let count_sql = format!("SELECT COUNT(*) FROM recipes WHERE 1 = 1{clauses}");
    let count = bind_scalar(sqlx::query_scalar::<Sqlite, i64>(&count_sql), &args)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "{RECIPE_QUERY}{clauses} \
         ORDER BY recipes.pub_date DESC, recipes.id DESC LIMIT ? OFFSET ?"
    );
    let rows = bind_query_as(
        sqlx::query_as::<Sqlite, RecipeRow>(&list_sql)
            .bind(viewer)
            .bind(viewer)
            .bind(viewer),
        &args,
    )
    .bind(i64::from(query.limit))
    .bind(query.offset())
    .fetch_all(pool)
    .await?;

    Ok((count, rows))
}

pub async fn get_recipe_row(
    pool: &SqlitePool,
    viewer: Option<i64>,
    id: i64,
) -> Result<Option<RecipeRow>, RequestError> {
    let sql = format!("{RECIPE_QUERY} AND recipes.id = ?");
    let row = sqlx::query_as::<Sqlite, RecipeRow>(&sql)
        .bind(viewer)
        .bind(viewer)
        .bind(viewer)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_recipe_short(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<RecipeShortRow>, RequestError> {
    let row = sqlx::query_as::<Sqlite, RecipeShortRow>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_recipe_author(pool: &SqlitePool, id: i64) -> Result<Option<i64>, RequestError> {
    let author = sqlx::query_scalar::<Sqlite, i64>("SELECT author_id FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(author)
}

/// Whether the author already has a recipe with this name, excluding
/// the recipe being updated.
pub async fn recipe_name_taken(
    pool: &SqlitePool,
    author_id: i64,
    name: &str,
    exclude: Option<i64>,
) -> Result<bool, RequestError> {
    let taken = sqlx::query_scalar::<Sqlite, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM recipes
                       WHERE author_id = $1 AND name = $2
                         AND ($3 IS NULL OR id <> $3))
        "#,
    )
    .bind(author_id)
    .bind(name)
    .bind(exclude)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Inserts the recipe and both edge sets in one transaction.
pub async fn create_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    name: &str,
    text: &str,
    cooking_time: i64,
    image_key: &str,
    tags: &[i64],
    ingredients: &[IngredientAmount],
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let recipe_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO recipes (name, text, author_id, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(text)
    .bind(author_id)
    .bind(image_key)
    .bind(cooking_time)
    .fetch_one(&mut tx)
    .await?;

    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut tx)
            .await?;
    }
    for ingredient in ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(ingredient.id)
        .bind(ingredient.amount)
        .execute(&mut tx)
        .await?;
    }
    tx.commit().await?;
    Ok(recipe_id)
}

/// Applies the provided fields and replaces any provided edge set
/// wholesale, all in one transaction.
#[allow(clippy::too_many_arguments)]
pub async fn update_recipe_in_db(
    pool: &SqlitePool,
    recipe_id: i64,
    name: Option<&str>,
    text: Option<&str>,
    cooking_time: Option<i64>,
    image_key: Option<&str>,
    tags: Option<&[i64]>,
    ingredients: Option<&[IngredientAmount]>,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let mut sets = Vec::new();
    let mut args = Vec::new();
    if let Some(name) = name {
        sets.push("name = ?");
        args.push(Arg::Text(name.to_string()));
    }
    if let Some(text) = text {
        sets.push("text = ?");
        args.push(Arg::Text(text.to_string()));
    }
    if let Some(cooking_time) = cooking_time {
        sets.push("cooking_time = ?");
        args.push(Arg::Int(cooking_time));
    }
    if let Some(image_key) = image_key {
        sets.push("image = ?");
        args.push(Arg::Text(image_key.to_string()));
    }
    if !sets.is_empty() {
        let sql = format!("UPDATE recipes SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        for arg in &args {
            query = match arg {
                Arg::Int(value) => query.bind(*value),
                Arg::Bool(value) => query.bind(*value),
                Arg::Text(value) => query.bind(value.as_str()),
            };
        }
        query.bind(recipe_id).execute(&mut tx).await?;
    }

    if let Some(tags) = tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut tx)
            .await?;
        for tag_id in tags {
            sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
                .bind(recipe_id)
                .bind(tag_id)
                .execute(&mut tx)
                .await?;
        }
    }
    if let Some(ingredients) = ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut tx)
            .await?;
        for ingredient in ingredients {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(ingredient.id)
            .bind(ingredient.amount)
            .execute(&mut tx)
            .await?;
        }
    }
    tx.commit().await?;
    Ok(())
}

/// Deletes the recipe; edges, favorites and cart rows cascade.
pub async fn delete_recipe_in_db(pool: &SqlitePool, recipe_id: i64) -> Result<(), RequestError> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every ingredient edge of every recipe in the user's cart, in a
/// deterministic order (cart recipes newest-first, ingredients by name)
/// so the aggregated report is stable for a given database state.
pub async fn get_cart_items(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<CartItemRow>, RequestError> {
    let rows = sqlx::query_as::<Sqlite, CartItemRow>(
        r#"
        SELECT ingredients.name, ingredients.measurement_unit, recipe_ingredients.amount
        FROM cart_entries
        JOIN recipes ON recipes.id = cart_entries.recipe_id
        JOIN recipe_ingredients ON recipe_ingredients.recipe_id = recipes.id
        JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE cart_entries.user_id = $1
        ORDER BY recipes.pub_date DESC, recipes.id DESC, ingredients.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
