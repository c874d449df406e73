use serde::{Deserialize, Serialize};

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,

    pub count: i64,
}

impl From<RecipeRow> for Recipe {
    fn from(value: RecipeRow) -> Self {
        Self {
            id: value.id,
            author_id: value.author_id,
            name: value.name,
            image: value.image,
            text: value.text,
            cooking_time: value.cooking_time,
        }
    }
}

/// Compact recipe view used by favorite/cart responses and embedded in
/// subscription listings.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeSummary {
    fn from(value: Recipe) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image: value.image,
            cooking_time: value.cooking_time,
        }
    }
}

/// Ingredient association joined with its ingredient, as embedded in the
/// recipe detail view.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Author row for subscription listings, carrying the follower page total
/// and the author's recipe count.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct AuthorRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub recipes_count: i64,

    pub count: i64,
}

/// One shopping-list line: amounts summed over every cart recipe, grouped
/// by ingredient name and unit.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}
