use warp::reject::Rejection;
use warp::reply::Reply;

use crate::config::Context;
use crate::database::actions;
use crate::error::HttpError;
use crate::schema::Uuid;

pub async fn list(ctx: Context) -> Result<impl Reply, Rejection> {
    let tags = actions::tags::list_tags(&ctx.pool).await?;
    Ok(warp::reply::json(&tags))
}

pub async fn retrieve(id: Uuid, ctx: Context) -> Result<impl Reply, Rejection> {
    match actions::tags::get_tag(id, &ctx.pool).await? {
        Some(tag) => Ok(warp::reply::json(&tag)),
        None => Err(HttpError::NotFound.default().into()),
    }
}
