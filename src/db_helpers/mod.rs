use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::User;

mod ingredient_helpers;
mod recipe_helpers;
mod relation_helpers;
mod subscription_helpers;
mod tag_helpers;
mod user_helpers;

pub use ingredient_helpers::*;
pub use recipe_helpers::*;
pub use relation_helpers::*;
pub use subscription_helpers::*;
pub use tag_helpers::*;
pub use user_helpers::*;

/// Builds `(?, ?, ...)` with one placeholder per element, for dynamic
/// `IN` lists.
fn placeholders(count: usize) -> String {
    let mut out = String::from("(");
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out.push(')');
    out
}

// ----------------- Shared user lookups -----------------

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT id, username, email, first_name, last_name, password, is_admin, created_at
        FROM users WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT id, username, email, first_name, last_name, password, is_admin, created_at
        FROM users WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn builds_placeholder_lists() {
        assert_eq!(placeholders(1), "(?)");
        assert_eq!(placeholders(3), "(?, ?, ?)");
    }
}
