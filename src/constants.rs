pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;

/// Default number of recipes embedded per author in subscription listings,
/// overridable with the `recipes_limit` query parameter.
pub const SUBSCRIPTION_RECIPES_LIMIT: i64 = 6;

pub const MIN_POSITIVE_VALUE: i32 = 1;
pub const MAX_POSITIVE_VALUE: i32 = 32_000;

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;
pub const RECIPE_NAME_MAX_LENGTH: usize = 256;
pub const TAG_SLUG_MAX_LENGTH: usize = 50;

pub const SESSION_LIFETIME_HOURS: i64 = 720;

pub const TOKEN_HEADER_PREFIX: &str = "Token ";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
