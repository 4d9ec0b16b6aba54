use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Public user projection with the viewer-scoped subscription flag.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// One recipe joined to its author, with the viewer-scoped booleans
/// resolved by the query itself.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i64,
    pub pub_date: NaiveDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_email: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub is_subscribed: bool,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeShortRow {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

/// Tag edge of a recipe, carried with its recipe id for batched lookups.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeTagRow {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: String,
}

/// Ingredient edge of a recipe with its per-recipe amount.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeIngredientRow {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// A subscribed author with their recipe count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub recipes_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorRecipeRow {
    pub author_id: i64,
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

/// One ingredient edge of a recipe currently in a shopping cart.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}
