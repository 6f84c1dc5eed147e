use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

/// Relation kinds toggled directly by user action. Each kind maps to a single
/// two-column table guarded by a unique (owner, target) constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl RelationKind {
    pub fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::ShoppingCart => "shopping_carts",
            RelationKind::Subscription => "subscriptions",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "user_id",
            RelationKind::Subscription => "subscriber_id",
        }
    }

    pub fn target_column(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::ShoppingCart => "recipe_id",
            RelationKind::Subscription => "author_id",
        }
    }
}

impl TryFrom<Value> for RelationKind {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "favorite" => Ok(Self::Favorite),
                "shopping_cart" => Ok(Self::ShoppingCart),
                "subscription" => Ok(Self::Subscription),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,

    pub count: i64,
}

/// Link row joining a recipe to an ingredient with a positive amount.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Id,
    pub ingredient_id: Id,
    pub amount: i32,
}

/// Ingredient amount joined with its catalog entry, the shape serialized
/// inside a recipe detail.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct LinkedRecipeTag {
    pub recipe_id: Id,
    pub tag_id: Id,
}

/// One (ingredient, amount) occurrence pulled from a cart recipe, before
/// aggregation.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

// Request payloads. The HTTP layer deserializes these straight from JSON
// bodies; validation lives in database::validation.

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountPayload {
    pub id: Id,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmountPayload>,
    pub tags: Vec<Id>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn relation_kind_parses_from_json() {
        assert_eq!(
            RelationKind::try_from(json!("favorite")).unwrap(),
            RelationKind::Favorite
        );
        assert_eq!(
            RelationKind::try_from(json!("shopping_cart")).unwrap(),
            RelationKind::ShoppingCart
        );
        assert_eq!(
            RelationKind::try_from(json!("subscription")).unwrap(),
            RelationKind::Subscription
        );
        assert!(RelationKind::try_from(json!("follower")).is_err());
        assert!(RelationKind::try_from(json!(3)).is_err());
    }

    #[test]
    fn relation_kind_column_mapping() {
        assert_eq!(RelationKind::Favorite.table(), "favorites");
        assert_eq!(RelationKind::Favorite.owner_column(), "user_id");
        assert_eq!(RelationKind::Favorite.target_column(), "recipe_id");

        assert_eq!(RelationKind::ShoppingCart.table(), "shopping_carts");

        assert_eq!(RelationKind::Subscription.table(), "subscriptions");
        assert_eq!(RelationKind::Subscription.owner_column(), "subscriber_id");
        assert_eq!(RelationKind::Subscription.target_column(), "author_id");
    }

    #[test]
    fn recipe_timestamps_serialize() {
        let row = RecipeRow {
            id: 7,
            author_id: 1,
            name: String::from("Ratatouille"),
            image: String::from("ratatouille.png"),
            cooking_time: 45,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            count: 1,
        };

        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("created_at").unwrap().is_string());
    }

    #[test]
    fn password_is_not_serialized() {
        let user = User {
            id: 1,
            username: String::from("chef"),
            email: String::from("chef@example.com"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            password: String::from("secret-hash"),
            role: UserRole::User,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value.get("username").unwrap(), "chef");
    }
}
