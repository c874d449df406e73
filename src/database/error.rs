use serde::Serialize;
use warp::http::StatusCode;
use warp::reject::Rejection;

/// HTTP-coded error carried through warp rejections and rendered as
/// `{"detail": ...}` by the rejection handler.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("http {code}: {info:?}")]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
}

impl warp::reject::Reject for Error {}

impl Error {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}


#[derive(Debug, Clone, Copy)]
pub enum HttpError {
    InvalidRequest,
    InvalidSession,
    Unauthorized,
    NotFound,
    InternalServerError,
}

impl HttpError {
    fn code(self) -> u16 {
        match self {
            HttpError::InvalidRequest => 400,
            HttpError::InvalidSession => 401,
            HttpError::Unauthorized => 403,
            HttpError::NotFound => 404,
            HttpError::InternalServerError => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
        }
    }

    pub fn default(self) -> Error {
        Error {
            code: self.code(),
            info: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("query failed: {info}")]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(String::from("Unknown error")),
        }
    }
}

// Manual Into only: a `From<QueryError> for Error` impl would leave the
// target of `.map_err(|e| QueryError::from(e).into())?` ambiguous.
#[allow(clippy::from_over_into)]
impl Into<Error> for QueryError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("({info})")]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

#[allow(clippy::from_over_into)]
impl Into<Error> for TypeError {
    fn into(self) -> Error {
        HttpError::InvalidRequest.new(&self.info)
    }
}

impl From<TypeError> for Rejection {
    fn from(value: TypeError) -> Self {
        let error: Error = value.into();
        warp::reject::custom(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_codes_map_to_status() {
        assert_eq!(HttpError::InvalidRequest.default().status(), StatusCode::BAD_REQUEST);
        assert_eq!(HttpError::InvalidSession.default().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(HttpError::Unauthorized.default().status(), StatusCode::FORBIDDEN);
        assert_eq!(HttpError::NotFound.default().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn type_error_converts_to_bad_request() {
        let error: Error = TypeError::new("amount out of bounds").into();
        assert_eq!(error.code, 400);
        assert_eq!(error.info.as_deref(), Some("amount out of bounds"));
    }

    #[test]
    fn query_error_converts_to_internal() {
        let error: Error = QueryError::from(sqlx::Error::PoolClosed).into();
        assert_eq!(error.code, 500);
    }

    // Exercises the conversion exactly the way the actions layer writes it,
    // so the error type stays inferable at those sites.
    fn run_query() -> Result<i32, Error> {
        let result: Result<i32, sqlx::Error> = Err(sqlx::Error::PoolClosed);
        result.map_err(|e| QueryError::from(e).into())
    }

    #[test]
    fn map_err_into_resolves_to_error() {
        let error = run_query().unwrap_err();
        assert_eq!(error.code, 500);
    }

    #[test]
    fn errors_become_findable_rejections() {
        let rejection = Rejection::from(HttpError::NotFound.default());
        let found = rejection.find::<Error>().map(|e| e.code);
        assert_eq!(found, Some(404));
    }

    #[test]
    fn type_errors_become_rejections() {
        let rejection = Rejection::from(TypeError::new("bad value"));
        let found = rejection.find::<Error>().map(|e| e.code);
        assert_eq!(found, Some(400));
    }
}
