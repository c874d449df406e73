use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use crate::config::Context;
use crate::constants::TOKEN_HEADER_PREFIX;
use crate::database::actions;
use crate::error::{Error, HttpError};

use super::jwt::{verify_jwt_session, SessionData};

pub fn with_context(ctx: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// Resolves the `Authorization: Token <jwt>` header into a session. The
/// token must carry a valid signature, be unexpired, and still exist in
/// `auth_tokens` (logout deletes it).
async fn resolve_session(
    header: Option<String>,
    ctx: &Context,
) -> Result<Option<SessionData>, Error> {
    let Some(header) = header else {
        return Ok(None);
    };

    let token = header
        .strip_prefix(TOKEN_HEADER_PREFIX)
        .ok_or_else(|| HttpError::InvalidSession.new("Invalid Authorization header"))?;

    let claims = verify_jwt_session(token, ctx.config.jwt_secret.as_bytes())?;

    if !actions::users::token_exists(claims.user_id, token, &ctx.pool).await? {
        return Err(HttpError::InvalidSession.new("Invalid session; Token revoked"));
    }

    Ok(Some(claims.into()))
}

pub fn with_session(
    ctx: Context,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_context(ctx))
        .and_then(|header: Option<String>, ctx: Context| async move {
            match resolve_session(header, &ctx).await {
                Ok(Some(session)) => Ok(session),
                Ok(None) => Err(Rejection::from(
                    HttpError::InvalidSession.new("Authentication credentials were not provided"),
                )),
                Err(e) => Err(Rejection::from(e)),
            }
        })
}

// Optional does not mean lenient: a present-but-bad token still answers 401
// instead of downgrading the request to anonymous.
pub fn with_possible_session(
    ctx: Context,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_context(ctx))
        .and_then(|header: Option<String>, ctx: Context| async move {
            match resolve_session(header, &ctx).await {
                Ok(session) => Ok(session),
                Err(e) => Err(Rejection::from(e)),
            }
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::config::Config;

    // Invalid tokens fail the signature check before any query runs, so a
    // lazy pool that never connects is enough here.
    fn context() -> Context {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        Context {
            pool,
            config: Arc::new(Config {
                database_url: String::from("postgres://localhost/unused"),
                bind_addr: "127.0.0.1:8000".parse().unwrap(),
                jwt_secret: String::from("test-secret"),
                media_root: "media".into(),
            }),
        }
    }

    #[tokio::test]
    async fn missing_header_browses_anonymously() {
        let filter = with_possible_session(context());
        let session = warp::test::request().filter(&filter).await.unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn bad_token_is_rejected_even_when_session_is_optional() {
        let filter = with_possible_session(context());
        let result = warp::test::request()
            .header("authorization", "Token not-a-valid-token")
            .filter(&filter)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn wrong_header_scheme_is_rejected() {
        let filter = with_session(context());
        let result = warp::test::request()
            .header("authorization", "Bearer abc")
            .filter(&filter)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_header_fails_the_required_filter() {
        let filter = with_session(context());
        let result = warp::test::request().filter(&filter).await;
        assert!(result.is_err());
    }
}
