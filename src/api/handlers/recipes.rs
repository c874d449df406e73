use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

use crate::api::payload::{ProfileView, RecipePayload, RecipeView};
use crate::config::Context;
use crate::constants::RECIPE_COUNT_PER_PAGE;
use crate::database::actions;
use crate::database::actions::recipes::{RecipeContent, RecipeFilters};
use crate::error::{Error, HttpError, TypeError};
use crate::form::{QueryData, QueryForm};
use crate::jwt::SessionData;
use crate::media::{decode_base64_image, remove_image, store_image};
use crate::pagination::Page;
use crate::permissions::ActionType;
use crate::schema::{Recipe, RecipeSummary, Uuid};

/// Assembles the full detail view: expanded tags and ingredients, author
/// profile, and the viewer-relative flags.
async fn recipe_view(
    recipe: Recipe,
    viewer: Option<&SessionData>,
    ctx: &Context,
) -> Result<RecipeView, Error> {
    let tags = actions::recipes::list_recipe_tags(recipe.id, &ctx.pool).await?;
    let ingredients = actions::recipes::list_recipe_ingredients(recipe.id, &ctx.pool).await?;

    let author = actions::users::get_user_by_id(&ctx.pool, recipe.author_id)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.new("Recipe author is missing"))?;

    let (is_subscribed, is_favorited, is_in_shopping_cart) = match viewer {
        Some(session) => (
            actions::follows::is_subscribed(session.user_id, author.id, &ctx.pool).await?,
            actions::recipes::is_favorite(recipe.id, session.user_id, &ctx.pool).await?,
            actions::recipes::in_shopping_cart(recipe.id, session.user_id, &ctx.pool).await?,
        ),
        None => (false, false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author: ProfileView::new(&author, is_subscribed),
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Decodes and stores the submitted image, turning the payload into the
/// content passed to the database layer.
async fn to_content(
    payload: &RecipePayload,
    require_image: bool,
    ctx: &Context,
) -> Result<RecipeContent, Error> {
    let image = match payload.image.as_deref() {
        Some(data) => {
            let decoded = match decode_base64_image(data) {
                Ok(decoded) => decoded,
                Err(e) => return Err(e.into()),
            };
            Some(store_image(&decoded, &ctx.config.media_root).await?)
        }
        None if require_image => {
            return Err(TypeError::new("Image is required").into());
        }
        None => None,
    };

    Ok(RecipeContent {
        name: payload.name.to_owned(),
        text: payload.text.to_owned(),
        cooking_time: payload.cooking_time,
        image,
        ingredients: payload.ingredients.iter().map(|i| (i.id, i.amount)).collect(),
        tags: payload.tags.clone(),
    })
}

pub async fn list(
    query: QueryData,
    session: Option<SessionData>,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let form = QueryForm::from_data(query);
    let page = form.get_number::<i64>("page")?.unwrap_or(1);
    let limit = form
        .get_number::<i64>("limit")?
        .unwrap_or(RECIPE_COUNT_PER_PAGE)
        .max(1);

    let filters = RecipeFilters {
        author: form.get_number::<Uuid>("author")?,
        tags: form.get_all("tags"),
        is_favorited: form.get_bool("is_favorited")?,
        is_in_shopping_cart: form.get_bool("is_in_shopping_cart")?,
    };

    let viewer = session.as_ref().map(|s| s.user_id);
    let rows =
        actions::recipes::fetch_recipes(&filters, viewer, page, limit, form.pairs(), &ctx.pool)
            .await?;

    let mut results = Vec::with_capacity(rows.results.len());
    for row in rows.results {
        results.push(recipe_view(row.into(), session.as_ref(), &ctx).await?);
    }

    let page = Page {
        count: rows.count,
        next: rows.next,
        previous: rows.previous,
        results,
    };

    Ok(warp::reply::json(&page))
}

pub async fn create(
    payload: RecipePayload,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::CreateRecipes)?;
    payload.validate()?;

    let content = to_content(&payload, true, &ctx).await?;
    let recipe = match actions::recipes::create_recipe(session.user_id, &content, &ctx.pool).await
    {
        Ok(recipe) => recipe,
        Err(e) => {
            discard_stored_image(&content, &ctx).await;
            return Err(e.into());
        }
    };

    let view = recipe_view(recipe, Some(&session), &ctx).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&view),
        StatusCode::CREATED,
    ))
}

pub async fn retrieve(
    id: Uuid,
    session: Option<SessionData>,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = actions::recipes::get_recipe(id, &ctx.pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())?;

    let view = recipe_view(recipe, session.as_ref(), &ctx).await?;
    Ok(warp::reply::json(&view))
}

pub async fn update(
    id: Uuid,
    payload: RecipePayload,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = actions::recipes::get_recipe_mut(id, &session, &ctx.pool).await?;
    payload.validate()?;

    let content = to_content(&payload, false, &ctx).await?;
    let updated = match actions::recipes::update_recipe(&recipe, &content, &ctx.pool).await {
        Ok(updated) => updated,
        Err(e) => {
            discard_stored_image(&content, &ctx).await;
            return Err(e.into());
        }
    };

    // A replaced image leaves the previous file orphaned; drop it.
    if content.image.is_some() {
        if let Some(old) = &recipe.image {
            remove_image(old, &ctx.config.media_root).await;
        }
    }

    let view = recipe_view(updated, Some(&session), &ctx).await?;
    Ok(warp::reply::json(&view))
}

async fn discard_stored_image(content: &RecipeContent, ctx: &Context) {
    if let Some(image) = &content.image {
        remove_image(image, &ctx.config.media_root).await;
    }
}

pub async fn delete(id: Uuid, session: SessionData, ctx: Context) -> Result<impl Reply, Rejection> {
    let recipe = actions::recipes::get_recipe_mut(id, &session, &ctx.pool).await?;
    actions::recipes::delete_recipe(recipe.id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}

async fn get_existing(id: Uuid, ctx: &Context) -> Result<Recipe, Error> {
    actions::recipes::get_recipe(id, &ctx.pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.default())
}

pub async fn favorite_add(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnFavorites)?;

    let recipe = get_existing(id, &ctx).await?;
    actions::recipes::add_to_favorites(recipe.id, session.user_id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&RecipeSummary::from(recipe)),
        StatusCode::CREATED,
    ))
}

pub async fn favorite_remove(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnFavorites)?;

    let recipe = get_existing(id, &ctx).await?;
    actions::recipes::remove_from_favorites(recipe.id, session.user_id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn shopping_cart_add(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    let recipe = get_existing(id, &ctx).await?;
    actions::recipes::add_to_shopping_cart(recipe.id, session.user_id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&RecipeSummary::from(recipe)),
        StatusCode::CREATED,
    ))
}

pub async fn shopping_cart_remove(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    let recipe = get_existing(id, &ctx).await?;
    actions::recipes::remove_from_shopping_cart(recipe.id, session.user_id, &ctx.pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn download_shopping_cart(
    session: SessionData,
    ctx: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    let rows = actions::recipes::fetch_shopping_list(session.user_id, &ctx.pool).await?;
    let body = actions::recipes::format_shopping_list(&rows);

    let response = warp::http::Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header(
            "Content-Disposition",
            "attachment; filename=\"shopping_list.txt\"",
        )
        .body(body)
        .map_err(|_e| HttpError::InternalServerError.default())?;

    Ok(response)
}
