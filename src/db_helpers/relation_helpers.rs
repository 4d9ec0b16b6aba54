//! Generic user -> object relation rows. Favorites, cart entries and
//! subscriptions share their shape, so creation and removal are a single
//! parameterized pair of operations; the unique constraint on
//! (actor, target) makes concurrent duplicate POSTs resolve to exactly
//! one row.

use sqlx::SqlitePool;

use crate::errors::RequestError;

pub struct Relation {
    pub table: &'static str,
    pub actor_col: &'static str,
    pub target_col: &'static str,
}

pub const FAVORITE: Relation = Relation {
    table: "favorites",
    actor_col: "user_id",
    target_col: "recipe_id",
};

pub const CART: Relation = Relation {
    table: "cart_entries",
    actor_col: "user_id",
    target_col: "recipe_id",
};

pub const SUBSCRIPTION: Relation = Relation {
    table: "subscriptions",
    actor_col: "subscriber_id",
    target_col: "author_id",
};

#[derive(Debug, PartialEq, Eq)]
pub enum PinOutcome {
    Created,
    Duplicate,
}

/// Inserts the relation row. A violated unique constraint is reported
/// as `Duplicate` instead of an error so the handler can answer 400.
pub async fn pin(
    pool: &SqlitePool,
    relation: &Relation,
    actor: i64,
    target: i64,
) -> Result<PinOutcome, RequestError> {
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2)",
        relation.table, relation.actor_col, relation.target_col
    );
    match sqlx::query(&sql).bind(actor).bind(target).execute(pool).await {
        Ok(_) => Ok(PinOutcome::Created),
        Err(e) => {
            let e = RequestError::from(e);
            if e.is_unique_violation(relation.table) {
                Ok(PinOutcome::Duplicate)
            } else {
                Err(e)
            }
        }
    }
}

/// Removes the relation row. Returns whether a row was present.
pub async fn unpin(
    pool: &SqlitePool,
    relation: &Relation,
    actor: i64,
    target: i64,
) -> Result<bool, RequestError> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        relation.table, relation.actor_col, relation.target_col
    );
    let result = sqlx::query(&sql)
        .bind(actor)
        .bind(target)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
