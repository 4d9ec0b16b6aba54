use serde::Serialize;

use crate::images::media_url;
use crate::models::{
    AuthorRow, Ingredient, RecipeIngredientRow, RecipeRow, RecipeShortRow, RecipeTagRow, Tag,
    UserRow,
};

#[derive(Serialize, Debug)]
pub struct TokenResponse {
    pub auth_token: String,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl From<UserRow> for UserResponse {
    fn from(
        UserRow {
            id,
            username,
            email,
            first_name,
            last_name,
            is_subscribed,
        }: UserRow,
    ) -> Self {
        UserResponse {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(Tag { id, name, slug, color }: Tag) -> Self {
        TagResponse {
            id,
            name,
            color,
            slug,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(
        Ingredient {
            id,
            name,
            measurement_unit,
        }: Ingredient,
    ) -> Self {
        IngredientResponse {
            id,
            name,
            measurement_unit,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Full recipe projection of the read endpoints.
#[derive(Serialize, Debug)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: String,
}

impl RecipeResponse {
    pub fn new(
        row: RecipeRow,
        tags: Vec<RecipeTagRow>,
        ingredients: Vec<RecipeIngredientRow>,
    ) -> Self {
        RecipeResponse {
            id: row.id,
            tags: tags
                .into_iter()
                .map(|tag| TagResponse {
                    id: tag.id,
                    name: tag.name,
                    color: tag.color,
                    slug: tag.slug,
                })
                .collect(),
            author: UserResponse {
                id: row.author_id,
                email: row.author_email,
                username: row.author_username,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
                is_subscribed: row.is_subscribed,
            },
            ingredients: ingredients
                .into_iter()
                .map(|ingredient| RecipeIngredientResponse {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: ingredient.amount,
                })
                .collect(),
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
            name: row.name,
            image: media_url(&row.image),
            text: row.text,
            cooking_time: row.cooking_time,
            pub_date: row.pub_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Compact recipe form used by relation responses and subscription
/// embeds.
#[derive(Serialize, Debug)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<RecipeShortRow> for RecipeShortResponse {
    fn from(
        RecipeShortRow {
            id,
            name,
            image,
            cooking_time,
        }: RecipeShortRow,
    ) -> Self {
        RecipeShortResponse {
            id,
            name,
            image: media_url(&image),
            cooking_time,
        }
    }
}

/// A subscribed author with their recipes embedded.
#[derive(Serialize, Debug)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: i64,
}

impl SubscriptionResponse {
    pub fn new(author: AuthorRow, recipes: Vec<RecipeShortResponse>) -> Self {
        SubscriptionResponse {
            id: author.id,
            email: author.email,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: true,
            recipes,
            recipes_count: author.recipes_count,
        }
    }
}
