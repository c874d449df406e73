use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, QueryError},
    schema::{Tag, Uuid},
};

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id DESC")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(tag)
}

/// Tags matching the given ids, used to validate recipe payloads.
pub async fn list_tags_by_ids(ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> =
        sqlx::query_as("SELECT * FROM tags WHERE id = ANY($1) ORDER BY id DESC")
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Upserts a tag by slug; used by the fixture import binary.
pub async fn create_tag(
    name: &str,
    color: Option<&str>,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result = sqlx::query(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT (slug) DO NOTHING",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.rows_affected() > 0)
}
