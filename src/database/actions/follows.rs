use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, HttpError, QueryError},
    pagination::Page,
    schema::{AuthorRow, Uuid},
};

pub async fn is_subscribed(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM follows WHERE user_id = $1 AND following_id = $2")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}

/// Ids of every author the user follows, for stamping `is_subscribed`
/// onto listing rows in one query.
pub async fn list_following_ids(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Uuid>, Error> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT following_id FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn subscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if user_id == author_id {
        return Err(HttpError::InvalidRequest.new("You cannot subscribe to yourself"));
    }

    let result = sqlx::query(
        "INSERT INTO follows (user_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("You are already subscribed to this user"));
    }

    Ok(())
}

pub async fn unsubscribe(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND following_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("You are not subscribed to this user"));
    }

    Ok(())
}

/// Authors the user follows, newest first, with their recipe counts.
pub async fn fetch_subscriptions(
    user_id: Uuid,
    page: i64,
    limit: i64,
    query: &[(String, String)],
    pool: &Pool<Postgres>,
) -> Result<Page<AuthorRow>, Error> {
    let rows: Vec<AuthorRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM follows f
        INNER JOIN users u ON u.id = f.following_id
        WHERE f.user_id = $1
        ORDER BY f.id DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(limit)
    .bind(Page::<AuthorRow>::offset(page, limit))
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(Page::from_rows(
        rows,
        total_count,
        limit,
        page,
        "/api/users/subscriptions",
        query,
    ))
}
