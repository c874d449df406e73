use warp::reject::Rejection;
use warp::reply::Reply;

use crate::config::Context;
use crate::database::actions;
use crate::error::HttpError;
use crate::form::{QueryData, QueryForm};
use crate::schema::Uuid;

pub async fn list(query: QueryData, ctx: Context) -> Result<impl Reply, Rejection> {
    let form = QueryForm::from_data(query);
    let search = form.get_str("name");

    let ingredients = actions::ingredients::fetch_ingredients(search, &ctx.pool).await?;
    Ok(warp::reply::json(&ingredients))
}

pub async fn retrieve(id: Uuid, ctx: Context) -> Result<impl Reply, Rejection> {
    match actions::ingredients::get_ingredient(id, &ctx.pool).await? {
        Some(ingredient) => Ok(warp::reply::json(&ingredient)),
        None => Err(HttpError::NotFound.default().into()),
    }
}
