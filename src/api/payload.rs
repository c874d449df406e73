use serde::{Deserialize, Serialize};

use crate::constants::{
    EMAIL_MAX_LENGTH, MAX_POSITIVE_VALUE, MIN_POSITIVE_VALUE, NAME_MAX_LENGTH,
    RECIPE_NAME_MAX_LENGTH, USERNAME_MAX_LENGTH,
};
use crate::error::TypeError;
use crate::schema::{AuthorRow, RecipeIngredientRow, RecipeSummary, Tag, User, UserRow, Uuid};

fn validate_email(email: &str) -> Result<(), TypeError> {
    if email.is_empty() || email.len() > EMAIL_MAX_LENGTH {
        return Err(TypeError::new("Invalid email length"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(TypeError::new("Invalid email address"));
    };
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(TypeError::new("Invalid email address"));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), TypeError> {
    if username.is_empty() || username.len() > USERNAME_MAX_LENGTH {
        return Err(TypeError::new("Invalid username length"));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(TypeError::new(
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }
    Ok(())
}

fn within_bounds(value: i32) -> bool {
    (MIN_POSITIVE_VALUE..=MAX_POSITIVE_VALUE).contains(&value)
}

// Request payloads

#[derive(Debug, Deserialize)]
pub struct RegisterUserPayload {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterUserPayload {
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_email(&self.email)?;
        validate_username(&self.username)?;
        if self.first_name.len() > NAME_MAX_LENGTH || self.last_name.len() > NAME_MAX_LENGTH {
            return Err(TypeError::new("Name is too long"));
        }
        if self.password.is_empty() {
            return Err(TypeError::new("Password must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordPayload {
    pub current_password: String,
    pub new_password: String,
}

impl SetPasswordPayload {
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.new_password.is_empty() {
            return Err(TypeError::new("Password must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipeIngredientPayload {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Vec<RecipeIngredientPayload>,
    pub tags: Vec<Uuid>,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipePayload {
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.is_empty() || self.name.len() > RECIPE_NAME_MAX_LENGTH {
            return Err(TypeError::new("Invalid recipe name length"));
        }
        if self.text.is_empty() {
            return Err(TypeError::new("Recipe text must not be empty"));
        }
        if !within_bounds(self.cooking_time) {
            return Err(TypeError::new("Cooking time is out of bounds"));
        }
        if self.ingredients.iter().any(|i| !within_bounds(i.amount)) {
            return Err(TypeError::new("Ingredient amount is out of bounds"));
        }

        let mut ingredient_ids: Vec<Uuid> = self.ingredients.iter().map(|i| i.id).collect();
        ingredient_ids.sort_unstable();
        ingredient_ids.dedup();
        if ingredient_ids.len() != self.ingredients.len() {
            return Err(TypeError::new("Duplicate ingredient in recipe"));
        }

        let mut tag_ids = self.tags.clone();
        tag_ids.sort_unstable();
        tag_ids.dedup();
        if tag_ids.len() != self.tags.len() {
            return Err(TypeError::new("Duplicate tag in recipe"));
        }

        Ok(())
    }
}

// Response views

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl ProfileView {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed,
        }
    }

    pub fn from_row(row: &UserRow, is_subscribed: bool) -> Self {
        Self {
            email: row.email.to_owned(),
            id: row.id,
            username: row.username.to_owned(),
            first_name: row.first_name.to_owned(),
            last_name: row.last_name.to_owned(),
            is_subscribed,
        }
    }
}

/// Registration response: the profile without the subscription flag.
#[derive(Debug, Serialize)]
pub struct RegistrationView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for RegistrationView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

impl SubscriptionView {
    pub fn from_user(user: &User, recipes: Vec<RecipeSummary>, recipes_count: i64) -> Self {
        Self {
            email: user.email.to_owned(),
            id: user.id,
            username: user.username.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            is_subscribed: true,
            recipes,
            recipes_count,
        }
    }

    pub fn from_author(author: &AuthorRow, recipes: Vec<RecipeSummary>) -> Self {
        Self {
            email: author.email.to_owned(),
            id: author.id,
            username: author.username.to_owned(),
            first_name: author.first_name.to_owned(),
            last_name: author.last_name.to_owned(),
            is_subscribed: true,
            recipes,
            recipes_count: author.recipes_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: ProfileView,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize)]
pub struct TokenView {
    pub auth_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_payload() -> RecipePayload {
        RecipePayload {
            ingredients: vec![
                RecipeIngredientPayload { id: 1, amount: 100 },
                RecipeIngredientPayload { id: 2, amount: 5 },
            ],
            tags: vec![1, 2],
            image: Some(String::from("data:image/png;base64,AAAA")),
            name: String::from("Pancakes"),
            text: String::from("Mix and fry."),
            cooking_time: 20,
        }
    }

    #[test]
    fn valid_recipe_payload_passes() {
        assert!(recipe_payload().validate().is_ok());
    }

    #[test]
    fn cooking_time_bounds_are_enforced() {
        let mut payload = recipe_payload();
        payload.cooking_time = 0;
        assert!(payload.validate().is_err());
        payload.cooking_time = MAX_POSITIVE_VALUE + 1;
        assert!(payload.validate().is_err());
        payload.cooking_time = MAX_POSITIVE_VALUE;
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn ingredient_amount_bounds_are_enforced() {
        let mut payload = recipe_payload();
        payload.ingredients[0].amount = 0;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn duplicate_associations_are_rejected() {
        let mut payload = recipe_payload();
        payload.ingredients.push(RecipeIngredientPayload { id: 1, amount: 10 });
        assert!(payload.validate().is_err());

        let mut payload = recipe_payload();
        payload.tags.push(2);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("plainaddress").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("some.user-1").is_ok());
        assert!(validate_username("with space").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"x".repeat(USERNAME_MAX_LENGTH + 1)).is_err());
    }
}
