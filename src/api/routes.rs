use warp::reject::Rejection;
use warp::reply::Reply;
use warp::Filter;

use crate::api::handlers;
use crate::authentication::middleware::{with_context, with_possible_session, with_session};
use crate::config::Context;
use crate::form::QueryData;
use crate::schema::Uuid;

/// The full route table. Everything lives under `/api` except the static
/// `/media` tree where recipe images are served from.
pub fn routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    tag_routes(ctx.clone())
        .or(ingredient_routes(ctx.clone()))
        .or(recipe_routes(ctx.clone()))
        .or(user_routes(ctx.clone()))
        .or(auth_routes(ctx.clone()))
        .or(media_routes(ctx))
}

fn tag_routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handlers::tags::list);

    let retrieve = warp::path!("api" / "tags" / Uuid)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handlers::tags::retrieve);

    list.or(retrieve)
}

fn ingredient_routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<QueryData>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::ingredients::list);

    let retrieve = warp::path!("api" / "ingredients" / Uuid)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handlers::ingredients::retrieve);

    list.or(retrieve)
}

fn recipe_routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(warp::query::<QueryData>())
        .and(with_possible_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::list);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::create);

    // Literal action routes go before the id capture.
    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::download_shopping_cart);

    let retrieve = warp::path!("api" / "recipes" / Uuid)
        .and(warp::get())
        .and(with_possible_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::retrieve);

    let update = warp::path!("api" / "recipes" / Uuid)
        .and(warp::patch().or(warp::put()).unify())
        .and(warp::body::json())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::update);

    let delete = warp::path!("api" / "recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::delete);

    let favorite_add = warp::path!("api" / "recipes" / Uuid / "favorite")
        .and(warp::post())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::favorite_add);

    let favorite_remove = warp::path!("api" / "recipes" / Uuid / "favorite")
        .and(warp::delete())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::favorite_remove);

    let cart_add = warp::path!("api" / "recipes" / Uuid / "shopping_cart")
        .and(warp::post())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::recipes::shopping_cart_add);

    let cart_remove = warp::path!("api" / "recipes" / Uuid / "shopping_cart")
        .and(warp::delete())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx))
        .and_then(handlers::recipes::shopping_cart_remove);

    list.or(create)
        .or(download)
        .or(retrieve)
        .or(update)
        .or(delete)
        .or(favorite_add)
        .or(favorite_remove)
        .or(cart_add)
        .or(cart_remove)
}

fn user_routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<QueryData>())
        .and(with_possible_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::list);

    let create = warp::path!("api" / "users")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::create);

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::me);

    let set_password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::set_password);

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<QueryData>())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::subscriptions);

    let retrieve = warp::path!("api" / "users" / Uuid)
        .and(warp::get())
        .and(with_possible_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::retrieve);

    let subscribe = warp::path!("api" / "users" / Uuid / "subscribe")
        .and(warp::post())
        .and(warp::query::<QueryData>())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::subscribe);

    let unsubscribe = warp::path!("api" / "users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx))
        .and_then(handlers::users::unsubscribe);

    list.or(create)
        .or(me)
        .or(set_password)
        .or(subscriptions)
        .or(retrieve)
        .or(subscribe)
        .or(unsubscribe)
}

fn auth_routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(ctx.clone()))
        .and_then(handlers::users::login);

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(ctx.clone()))
        .and(with_context(ctx))
        .and_then(handlers::users::logout);

    login.or(logout)
}

fn media_routes(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("media")
        .and(warp::get())
        .and(warp::fs::dir(ctx.config.media_root.clone()))
}
