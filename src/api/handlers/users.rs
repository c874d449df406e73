use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::api::payload::{
    LoginPayload, ProfileView, RegisterUserPayload, RegistrationView, SetPasswordPayload,
    SubscriptionView, TokenView,
};
use crate::authentication::cryptography::{hash_password, verify_password};
use crate::config::Context;
use crate::constants::{SUBSCRIPTION_RECIPES_LIMIT, USER_COUNT_PER_PAGE};
use crate::database::actions;
use crate::error::HttpError;
use crate::form::{QueryData, QueryForm};
use crate::jwt::SessionData;
use crate::pagination::Page;
use crate::permissions::ActionType;
use crate::schema::Uuid;

pub async fn list(
    query: QueryData,
    session: Option<SessionData>,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let form = QueryForm::from_data(query);
    let page = form.get_number::<i64>("page")?.unwrap_or(1);
    let limit = form
        .get_number::<i64>("limit")?
        .unwrap_or(USER_COUNT_PER_PAGE)
        .max(1);

    let users = actions::users::fetch_users(page, limit, form.pairs(), &ctx.pool).await?;

    let following = match &session {
        Some(session) => actions::follows::list_following_ids(session.user_id, &ctx.pool).await?,
        None => vec![],
    };

    let page = users.map(|row| {
        let is_subscribed = following.contains(&row.id);
        ProfileView::from_row(&row, is_subscribed)
    });

    Ok(warp::reply::json(&page))
}

pub async fn create(payload: RegisterUserPayload, ctx: Context) -> Result<impl Reply, Rejection> {
    payload.validate()?;

    let password = hash_password(&payload.password)
        .map_err(|_e| HttpError::InternalServerError.new("Failed to hash password"))?;

    let user = actions::users::register_user(
        &payload.email,
        &payload.username,
        &payload.first_name,
        &payload.last_name,
        &password,
        &ctx.pool,
    )
    .await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&RegistrationView::from(&user)),
        StatusCode::CREATED,
    ))
}

pub async fn retrieve(
    id: Uuid,
    session: Option<SessionData>,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let user = actions::users::get_user_by_id(&ctx.pool, id)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    let is_subscribed = match &session {
        Some(session) => actions::follows::is_subscribed(session.user_id, user.id, &ctx.pool).await?,
        None => false,
    };

    Ok(warp::reply::json(&ProfileView::new(&user, is_subscribed)))
}

pub async fn me(session: SessionData, ctx: Context) -> Result<impl Reply, Rejection> {
    let user = actions::users::get_user_by_id(&ctx.pool, session.user_id)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    Ok(warp::reply::json(&ProfileView::new(&user, false)))
}

pub async fn set_password(
    payload: SetPasswordPayload,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    payload.validate()?;

    let user = actions::users::get_user_by_id(&ctx.pool, session.user_id)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    let authenticated = verify_password(&payload.current_password, &user.password)
        .map_err(|_e| HttpError::InternalServerError.new("Corrupt password hash"))?;
    if !authenticated {
        return Err(HttpError::InvalidRequest.new("Incorrect password").into());
    }

    let password = hash_password(&payload.new_password)
        .map_err(|_e| HttpError::InternalServerError.new("Failed to hash password"))?;
    actions::users::set_password(user.id, &password, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn subscriptions(
    query: QueryData,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let form = QueryForm::from_data(query);
    let page = form.get_number::<i64>("page")?.unwrap_or(1);
    let limit = form
        .get_number::<i64>("limit")?
        .unwrap_or(USER_COUNT_PER_PAGE)
        .max(1);
    let recipes_limit = form
        .get_number::<i64>("recipes_limit")?
        .unwrap_or(SUBSCRIPTION_RECIPES_LIMIT);

    let authors = actions::follows::fetch_subscriptions(
        session.user_id,
        page,
        limit,
        form.pairs(),
        &ctx.pool,
    )
    .await?;

    let mut results = Vec::with_capacity(authors.results.len());
    for author in &authors.results {
        let recipes =
            actions::recipes::fetch_author_recipes(author.id, recipes_limit, &ctx.pool).await?;
        results.push(SubscriptionView::from_author(author, recipes));
    }

    let page = Page {
        count: authors.count,
        next: authors.next,
        previous: authors.previous,
        results,
    };

    Ok(warp::reply::json(&page))
}

pub async fn subscribe(
    id: Uuid,
    query: QueryData,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let author = actions::users::get_user_by_id(&ctx.pool, id)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    actions::follows::subscribe(session.user_id, author.id, &ctx.pool).await?;

    let form = QueryForm::from_data(query);
    let recipes_limit = form
        .get_number::<i64>("recipes_limit")?
        .unwrap_or(SUBSCRIPTION_RECIPES_LIMIT);

    let recipes = actions::recipes::fetch_author_recipes(author.id, recipes_limit, &ctx.pool).await?;
    let recipes_count = actions::recipes::count_author_recipes(author.id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&SubscriptionView::from_user(&author, recipes, recipes_count)),
        StatusCode::CREATED,
    ))
}

pub async fn unsubscribe(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let author = actions::users::get_user_by_id(&ctx.pool, id)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    actions::follows::unsubscribe(session.user_id, author.id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn login(payload: LoginPayload, ctx: Context) -> Result<impl Reply, Rejection> {
    let (token, created) = actions::users::login_user(
        &payload.email,
        &payload.password,
        ctx.config.jwt_secret.as_bytes(),
        &ctx.pool,
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&TokenView { auth_token: token }),
        status,
    ))
}

pub async fn logout(session: SessionData, ctx: Context) -> Result<impl Reply, Rejection> {
    actions::users::logout_user(session.user_id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}
