use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use sqlx::{Pool, Postgres};

use crate::{
    constants::SHOPPING_LIST_FOOTER,
    database::{
        actions::users::get_user_by_id,
        error::{Error, QueryError, RequestError, ValidationError},
        schema::{CartIngredientRow, Id, ShoppingListItem, User},
    },
};

/// Every (ingredient, amount) occurrence across the user's cart recipes,
/// one row per recipe ingredient, unaggregated.
pub async fn list_cart_ingredients(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredientRow>, Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_carts sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Groups cart rows by (name, measurement unit) and sums amounts. The
/// BTreeMap key gives a stable output order.
pub fn aggregate_cart(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut groups: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *groups
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += row.amount as i64;
    }

    groups
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// Renders the aggregated cart as the downloadable text document, returning
/// (filename, body). An empty cart is a client error.
pub fn compose_shopping_list(
    user: &User,
    rows: Vec<CartIngredientRow>,
    today: NaiveDate,
) -> Result<(String, String), ValidationError> {
    if rows.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let items = aggregate_cart(rows);

    let mut text = format!(
        "Shopping list for: {}\n\nDate: {}\n\n",
        user.full_name(),
        today.format("%Y-%m-%d")
    );
    text += &items
        .iter()
        .map(|item| format!("- {} ({}) - {}", item.name, item.measurement_unit, item.amount))
        .collect::<Vec<String>>()
        .join("\n");
    text += &format!(
        "\n\n{} ({})",
        SHOPPING_LIST_FOOTER,
        today.format("%Y")
    );

    let filename = format!("{}_shopping_list.txt", user.username);

    Ok((filename, text))
}

pub async fn build_shopping_list(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(String, String), Error> {
    let user = match get_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Err(RequestError::InvalidRequest.new("No user exists with specified id")),
    };

    let rows = list_cart_ingredients(user_id, pool).await?;

    compose_shopping_list(&user, rows, Local::now().date_naive()).map_err(|e| e.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn user() -> User {
        User {
            id: 7,
            username: String::from("jchild"),
            email: String::from("jchild@example.com"),
            first_name: String::from("Julia"),
            last_name: String::from("Child"),
            password: String::from("hash"),
            role: UserRole::User,
        }
    }

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn amounts_are_summed_per_name_and_unit() {
        let items = aggregate_cart(vec![
            row("flour", "g", 100),
            row("flour", "g", 50),
            row("milk", "ml", 200),
        ]);

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            ShoppingListItem {
                name: String::from("flour"),
                measurement_unit: String::from("g"),
                amount: 150,
            }
        );
        assert_eq!(items[1].name, "milk");
        assert_eq!(items[1].amount, 200);
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let items = aggregate_cart(vec![row("sugar", "g", 100), row("sugar", "tbsp", 2)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn list_text_and_filename() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let rows = vec![row("flour", "g", 100), row("flour", "g", 50)];

        let (filename, text) = compose_shopping_list(&user(), rows, today).unwrap();

        assert_eq!(filename, "jchild_shopping_list.txt");
        assert_eq!(
            text,
            "Shopping list for: Julia Child\n\n\
             Date: 2026-08-29\n\n\
             - flour (g) - 150\n\n\
             Cookbook (2026)"
        );
    }

    #[test]
    fn empty_cart_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let result = compose_shopping_list(&user(), vec![], today);
        assert_eq!(result.unwrap_err(), ValidationError::EmptyCart);
    }

    #[test]
    fn output_order_is_stable() {
        let items = aggregate_cart(vec![
            row("zucchini", "pcs", 1),
            row("apple", "pcs", 2),
            row("milk", "ml", 500),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "milk", "zucchini"]);
    }
}
