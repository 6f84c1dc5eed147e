use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    cache::cache::{delete_cache_value, get_or, CacheKeyType},
    constants::{CATALOG_CACHE_TTL, INGREDIENT_COUNT_PER_PAGE},
    database::{
        error::{Error, QueryError, ValidationError},
        pagination::PageContext,
        schema::{Id, Ingredient, IngredientRow},
    },
};

use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    session: &SessionData,
    name: &str,
    measurement_unit: &str,
    cache: &mut MultiplexedConnection,
    pool: &Pool<Postgres>,
) -> Result<Id, Error> {
    session.authenticate(ActionType::ManageIngredients)?;

    if name.trim().is_empty() || measurement_unit.trim().is_empty() {
        return Err(
            ValidationError::invalid_field("Ingredient name and unit must not be empty").into(),
        );
    }

    let row: (Id,) = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        RETURNING id;
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    delete_cache_value(CacheKeyType::Ingredient.new("catalog"), cache).await?;

    Ok(row.0)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, Error> {
    let list: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

pub async fn list_ingredients_cached(
    cache: &mut MultiplexedConnection,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    get_or(
        CacheKeyType::Ingredient.new("catalog"),
        CATALOG_CACHE_TTL,
        cache,
        list_ingredients(pool),
    )
    .await
}

/// Paged ingredient search. The search term matches name prefixes, which is
/// what autocomplete in the recipe editor wants.
pub async fn fetch_ingredients(
    search: Option<String>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<IngredientRow>, Error> {
    let rows: Vec<IngredientRow> = match search {
        Some(search) => {
            sqlx::query_as(
                "
                SELECT i.*, COUNT(*) OVER() AS count FROM ingredients i
                WHERE i.name ILIKE $1
                ORDER BY i.name
                LIMIT $2 OFFSET $3
            ",
            )
            .bind(format!("{search}%"))
            .bind(INGREDIENT_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        None => {
            sqlx::query_as(
                "
                SELECT i.*, COUNT(*) OVER() AS count FROM ingredients i
                ORDER BY i.name
                LIMIT $1 OFFSET $2
            ",
            )
            .bind(INGREDIENT_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
    };

    let total_count = rows.first().map(|i| i.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, INGREDIENT_COUNT_PER_PAGE, offset);

    Ok(page)
}
