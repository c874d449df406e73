use sqlx::{Pool, Postgres};

use crate::{
    authentication::{cryptography::verify_password, jwt::generate_jwt_session},
    error::{Error, HttpError, QueryError},
    pagination::Page,
    schema::{User, UserRow, Uuid},
};

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_username(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn fetch_users(
    page: i64,
    limit: i64,
    query: &[(String, String)],
    pool: &Pool<Postgres>,
) -> Result<Page<UserRow>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id DESC
        LIMIT $1 OFFSET $2
    ",
    )
    .bind(limit)
    .bind(Page::<UserRow>::offset(page, limit))
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(Page::from_rows(
        rows,
        total_count,
        limit,
        page,
        "/api/users",
        query,
    ))
}

/// Creates a user; `password` is the already-hashed password. Uniqueness is
/// checked up front so the caller gets a field-specific message instead of
/// a bare constraint violation.
pub async fn register_user(
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<User, Error> {
    if get_user_by_email(pool, email).await?.is_some() {
        return Err(HttpError::InvalidRequest.new("A user with this email already exists"));
    }
    if get_user_by_username(pool, username).await?.is_some() {
        return Err(HttpError::InvalidRequest.new("A user with this username already exists"));
    }

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(user)
}

pub async fn set_password(
    user_id: Uuid,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Authenticates by email and password, then issues a session token.
/// One token per user: a still-valid stored token is returned as-is
/// (`created = false`), otherwise a fresh one replaces it.
pub async fn login_user(
    email: &str,
    password: &str,
    secret: &[u8],
    pool: &Pool<Postgres>,
) -> Result<(String, bool), Error> {
    let user = match get_user_by_email(pool, email).await? {
        Some(user) => user,
        None => return Err(HttpError::InvalidRequest.new("No user exists with this email")),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_e| HttpError::InternalServerError.new("Corrupt password hash"))?;
    if !authenticated {
        return Err(HttpError::InvalidRequest.new("Incorrect password"));
    }

    let stored: Option<(String,)> =
        sqlx::query_as("SELECT token FROM auth_tokens WHERE user_id = $1")
            .bind(user.id)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    if let Some((token,)) = stored {
        if crate::jwt::verify_jwt_session(&token, secret).is_ok() {
            return Ok((token, false));
        }
        logout_user(user.id, pool).await?;
    }

    let token = generate_jwt_session(&user, secret)?;
    sqlx::query("INSERT INTO auth_tokens (user_id, token) VALUES ($1, $2)")
        .bind(user.id)
        .bind(&token)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok((token, true))
}

pub async fn logout_user(user_id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn token_exists(
    user_id: Uuid,
    token: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM auth_tokens WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}
