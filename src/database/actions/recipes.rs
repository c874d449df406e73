use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::{
    authentication::permissions::ActionType,
    error::{Error, HttpError, QueryError},
    jwt::SessionData,
    pagination::Page,
    schema::{
        Recipe, RecipeIngredientRow, RecipeRow, RecipeSummary, ShoppingListRow, Tag, Uuid,
    },
};

use super::{ingredients::list_ingredients_by_ids, tags::list_tags_by_ids};

/// Optional predicates for recipe listings. The boolean flags toggle
/// between an EXISTS filter and its exclusion against the viewer's
/// favorite/cart rows; without a viewer they match nothing when asking
/// for "mine".
#[derive(Debug, Default, Clone)]
pub struct RecipeFilters {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

/// Scalar fields plus the full association sets submitted with a recipe.
/// `image` is the stored media path; `None` on update keeps the current one.
#[derive(Debug, Clone)]
pub struct RecipeContent {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub ingredients: Vec<(Uuid, i32)>,
    pub tags: Vec<Uuid>,
}

pub async fn fetch_recipes(
    filters: &RecipeFilters,
    viewer: Option<Uuid>,
    page: i64,
    limit: i64,
    query: &[(String, String)],
    pool: &Pool<Postgres>,
) -> Result<Page<RecipeRow>, Error> {
    let viewer_id = viewer.unwrap_or(-1);

    let mut builder =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filters.author {
        builder.push(" AND r.author_id = ").push_bind(author);
    }
    if !filters.tags.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
        );
        builder.push_bind(filters.tags.clone());
        builder.push("))");
    }
    if let Some(favorited) = filters.is_favorited {
        builder.push(if favorited { " AND EXISTS" } else { " AND NOT EXISTS" });
        builder.push(" (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ");
        builder.push_bind(viewer_id);
        builder.push(")");
    }
    if let Some(in_cart) = filters.is_in_shopping_cart {
        builder.push(if in_cart { " AND EXISTS" } else { " AND NOT EXISTS" });
        builder.push(" (SELECT 1 FROM shopping_carts sc WHERE sc.recipe_id = r.id AND sc.user_id = ");
        builder.push_bind(viewer_id);
        builder.push(")");
    }

    builder.push(" ORDER BY r.id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(Page::<RecipeRow>::offset(page, limit));

    let rows: Vec<RecipeRow> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(Page::from_rows(
        rows,
        total_count,
        limit,
        page,
        "/api/recipes",
        query,
    ))
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Fetches a recipe for mutation: authors may edit their own, admins any.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(HttpError::Unauthorized.default())
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(HttpError::NotFound.new("No recipe exists with specified id")),
    }
}

async fn assert_associations_exist(
    content: &RecipeContent,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let tag_ids: Vec<Uuid> = content.tags.clone();
    if list_tags_by_ids(&tag_ids, pool).await?.len() != tag_ids.len() {
        return Err(HttpError::InvalidRequest.new("Tag doesn't exist"));
    }

    let ingredient_ids: Vec<Uuid> = content.ingredients.iter().map(|(id, _)| *id).collect();
    if list_ingredients_by_ids(&ingredient_ids, pool).await?.len() != ingredient_ids.len() {
        return Err(HttpError::InvalidRequest.new("Ingredient doesn't exist"));
    }

    Ok(())
}

async fn insert_associations(
    tr: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    content: &RecipeContent,
) -> Result<(), Error> {
    if !content.ingredients.is_empty() {
        let mut query =
            QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
        query.push_values(&content.ingredients, |mut row, (ingredient_id, amount)| {
            row.push_bind(recipe_id)
                .push_bind(*ingredient_id)
                .push_bind(*amount);
        });
        query
            .build()
            .execute(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    if !content.tags.is_empty() {
        let mut query = QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(&content.tags, |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query
            .build()
            .execute(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    Ok(())
}

pub async fn create_recipe(
    author_id: Uuid,
    content: &RecipeContent,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    assert_associations_exist(content, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(author_id)
    .bind(&content.name)
    .bind(&content.image)
    .bind(&content.text)
    .bind(content.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_associations(&mut tr, recipe.id, content).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(recipe)
}

/// Replaces the recipe's scalar fields, then drops every ingredient/tag
/// association and re-inserts the submitted set, all in one transaction.
pub async fn update_recipe(
    recipe: &Recipe,
    content: &RecipeContent,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    assert_associations_exist(content, pool).await?;

    let image = content.image.clone().or_else(|| recipe.image.clone());

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let updated: Recipe = sqlx::query_as(
        "
        UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4
        WHERE id = $5
        RETURNING *
    ",
    )
    .bind(&content.name)
    .bind(&image)
    .bind(&content.text)
    .bind(content.cooking_time)
    .bind(recipe.id)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_associations(&mut tr, recipe.id, content).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(updated)
}

pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, Error> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY rt.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn fetch_author_recipes(
    author_id: Uuid,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeSummary>, Error> {
    let rows: Vec<RecipeSummary> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY id DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn count_author_recipes(author_id: Uuid, pool: &Pool<Postgres>) -> Result<i64, Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.0)
}

pub async fn is_favorite(id: Uuid, user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE recipe_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}

pub async fn add_to_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("Recipe is already in favorites"));
    }

    Ok(())
}

pub async fn remove_from_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("Recipe is not in favorites"));
    }

    Ok(())
}

pub async fn in_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM shopping_carts WHERE recipe_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}

pub async fn add_to_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(
        "INSERT INTO shopping_carts (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("Recipe is already in shopping cart"));
    }

    Ok(())
}

pub async fn remove_from_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM shopping_carts WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() == 0 {
        return Err(HttpError::InvalidRequest.new("Recipe is not in shopping cart"));
    }

    Ok(())
}

/// Shopping-list lines for every recipe in the user's cart, amounts summed
/// per distinct ingredient + unit.
pub async fn fetch_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, Error> {
    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS amount
        FROM shopping_carts sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub fn format_shopping_list(rows: &[ShoppingListRow]) -> String {
    rows.iter()
        .map(|row| format!("{} - {} {}\n", row.name, row.amount, row.measurement_unit))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shopping_list_lines_are_name_amount_unit() {
        let rows = vec![
            ShoppingListRow {
                name: String::from("flour"),
                measurement_unit: String::from("g"),
                amount: 500,
            },
            ShoppingListRow {
                name: String::from("milk"),
                measurement_unit: String::from("ml"),
                amount: 250,
            },
        ];

        assert_eq!(
            format_shopping_list(&rows),
            "flour - 500 g\nmilk - 250 ml\n"
        );
    }

    #[test]
    fn empty_cart_formats_to_empty_list() {
        assert_eq!(format_shopping_list(&[]), "");
    }
}
