pub const USER_COUNT_PER_PAGE: i64 = 10;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 100;
pub const RECIPE_COUNT_PER_PAGE: i64 = 10;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 1440;

pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Usernames that collide with reserved routes or impersonate staff.
pub const BANNED_USERNAMES: &[&str] = &["me", "admin", "root", "subscriptions", "set_password"];

/// Seconds a cached tag/ingredient catalog entry stays valid.
pub const CATALOG_CACHE_TTL: u64 = 600;

pub const SHOPPING_LIST_FOOTER: &str = "Cookbook";
