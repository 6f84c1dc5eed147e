use std::collections::HashSet;

use crate::constants::{
    BANNED_USERNAMES, COOKING_TIME_MAX, COOKING_TIME_MIN, PASSWORD_MIN_LENGTH,
};

use super::error::ValidationError;
use super::schema::{NewUser, RecipePayload};

/// Normalizes a username to lowercase and rejects reserved names.
pub fn validate_username(value: &str) -> Result<String, ValidationError> {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return Err(ValidationError::invalid_field("Username must not be empty"));
    }
    if BANNED_USERNAMES.contains(&value.as_str()) {
        return Err(ValidationError::invalid_field(
            "This username is not allowed",
        ));
    }
    Ok(value)
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::invalid_field(
            "Password must be at least 8 characters long",
        ));
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_field(
            "Password must not be entirely numeric",
        ));
    }
    Ok(())
}

/// Validates a registration payload, returning the normalized username.
pub fn validate_new_user(payload: &NewUser) -> Result<String, ValidationError> {
    let username = validate_username(&payload.username)?;
    if !payload.email.contains('@') {
        return Err(ValidationError::invalid_field("Invalid email address"));
    }
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ValidationError::invalid_field(
            "First and last name are required",
        ));
    }
    validate_password(&payload.password)?;
    Ok(username)
}

pub fn validate_recipe_payload(payload: &RecipePayload) -> Result<(), ValidationError> {
    if payload.name.trim().is_empty() {
        return Err(ValidationError::invalid_field(
            "Recipe name must not be empty",
        ));
    }

    if payload.cooking_time < COOKING_TIME_MIN {
        return Err(ValidationError::invalid_field(
            "Cooking time must be at least 1 minute",
        ));
    }
    if payload.cooking_time > COOKING_TIME_MAX {
        return Err(ValidationError::invalid_field(
            "Cooking time must not exceed 1440 minutes",
        ));
    }

    if payload.ingredients.is_empty() {
        return Err(ValidationError::invalid_field(
            "Recipe must have at least one ingredient",
        ));
    }

    let mut seen_ingredients = HashSet::new();
    for ingredient in &payload.ingredients {
        if ingredient.amount <= 0 {
            return Err(ValidationError::invalid_field(
                "Ingredient amount must be at least 1",
            ));
        }
        if !seen_ingredients.insert(ingredient.id) {
            return Err(ValidationError::invalid_field(
                "Ingredients must not repeat",
            ));
        }
    }

    let mut seen_tags = HashSet::new();
    for tag_id in &payload.tags {
        if !seen_tags.insert(*tag_id) {
            return Err(ValidationError::invalid_field("Tags must not repeat"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IngredientAmountPayload;

    fn recipe_payload() -> RecipePayload {
        RecipePayload {
            name: String::from("Pancakes"),
            image: String::from("recipes/images/pancakes.png"),
            text: String::from("Mix and fry."),
            cooking_time: 20,
            ingredients: vec![
                IngredientAmountPayload { id: 1, amount: 200 },
                IngredientAmountPayload { id: 2, amount: 2 },
            ],
            tags: vec![1, 2],
        }
    }

    #[test]
    fn cooking_time_bounds() {
        let mut payload = recipe_payload();

        payload.cooking_time = 0;
        assert!(validate_recipe_payload(&payload).is_err());

        payload.cooking_time = 1441;
        assert!(validate_recipe_payload(&payload).is_err());

        payload.cooking_time = 1;
        assert!(validate_recipe_payload(&payload).is_ok());

        payload.cooking_time = 1440;
        assert!(validate_recipe_payload(&payload).is_ok());
    }

    #[test]
    fn duplicate_ingredient_rejected() {
        let mut payload = recipe_payload();
        payload.ingredients.push(IngredientAmountPayload { id: 1, amount: 50 });
        assert!(validate_recipe_payload(&payload).is_err());
    }

    #[test]
    fn duplicate_tag_rejected() {
        let mut payload = recipe_payload();
        payload.tags = vec![3, 3];
        assert!(validate_recipe_payload(&payload).is_err());
    }

    #[test]
    fn empty_ingredients_rejected() {
        let mut payload = recipe_payload();
        payload.ingredients.clear();
        assert!(validate_recipe_payload(&payload).is_err());
    }

    #[test]
    fn non_positive_amount_rejected() {
        let mut payload = recipe_payload();
        payload.ingredients[0].amount = 0;
        assert!(validate_recipe_payload(&payload).is_err());
    }

    #[test]
    fn banned_username_rejected() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("Admin").is_err());
        assert_eq!(validate_username("Chef").unwrap(), "chef");
    }

    #[test]
    fn weak_password_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("p4ncakes!").is_ok());
    }
}
