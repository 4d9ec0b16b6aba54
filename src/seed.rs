//! Bulk ingredient seed from a `name,measurement_unit` CSV file,
//! imported once at startup when `INGREDIENTS_CSV` is set.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlx::SqlitePool;

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Inserts every record of the CSV file in one transaction and returns
/// how many rows were imported.
pub async fn import_ingredients(pool: &SqlitePool, path: &Path) -> Result<u64> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open ingredients CSV {}", path.display()))?;
    let mut tx = pool.begin().await?;
    let mut imported = 0;
    for record in reader.deserialize() {
        let record: IngredientRecord = record.context("malformed ingredient record")?;
        sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2)")
            .bind(&record.name)
            .bind(&record.measurement_unit)
            .execute(&mut tx)
            .await?;
        imported += 1;
    }
    tx.commit().await?;
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::io::Write;

    async fn test_pool() -> SqlitePool {
        // One connection so the in-memory database survives across
        // acquires.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn imports_records_including_quoted_names() {
        let pool = test_pool().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,measurement_unit").unwrap();
        writeln!(file, "Молоко,мл").unwrap();
        writeln!(file, "\"яблоки, сушеные\",г").unwrap();
        let imported = import_ingredients(&pool, file.path()).await.unwrap();
        assert_eq!(imported, 2);

        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM ingredients ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(names, ["Молоко", "яблоки, сушеные"]);
    }

    #[tokio::test]
    async fn rejects_malformed_file() {
        let pool = test_pool().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,measurement_unit").unwrap();
        writeln!(file, "only-one-column").unwrap();
        assert!(import_ingredients(&pool, file.path()).await.is_err());
    }
}
