use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::{Ingredient, Uuid},
};

/// Lists ingredients, optionally narrowed by a case-insensitive name prefix.
pub async fn fetch_ingredients(
    search: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = match search {
        Some(name) => {
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY id DESC")
                .bind(format!("{name}%"))
                .fetch_all(pool)
                .await
                .map_err(|e| QueryError::from(e).into())?
        }
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY id DESC")
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?,
    };

    Ok(list)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Ingredients matching the given ids, used to validate recipe payloads.
pub async fn list_ingredients_by_ids(
    ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Upserts an ingredient; used by the fixture import binary.
pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result = sqlx::query(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT (name, measurement_unit) DO NOTHING
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.rows_affected() > 0)
}
