use std::convert::Infallible;

use serde_json::json;
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply};

use crate::error::Error;

/// Renders every rejection as a `{"detail": ...}` JSON body with the
/// matching status code.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found."))
    } else if let Some(error) = err.find::<Error>() {
        let status = error.status();
        let detail = error
            .info
            .clone()
            .unwrap_or_else(|| default_detail(status).to_string());
        (status, detail)
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, String::from("Invalid request body."))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, String::from("Invalid query string."))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            String::from("Method not allowed."),
        )
    } else {
        tracing::error!(?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            String::from("Internal server error."),
        )
    };

    let body = warp::reply::json(&json!({ "detail": detail }));
    Ok(warp::reply::with_status(body, status))
}

fn default_detail(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Invalid request.",
        StatusCode::UNAUTHORIZED => "Authentication credentials were not provided.",
        StatusCode::FORBIDDEN => "You do not have permission to perform this action.",
        StatusCode::NOT_FOUND => "Not found.",
        _ => "Internal server error.",
    }
}
