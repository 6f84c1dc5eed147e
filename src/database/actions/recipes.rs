use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    constants::RECIPE_COUNT_PER_PAGE,
    database::{
        error::{Error, QueryError, RequestError, ValidationError},
        pagination::PageContext,
        schema::{Id, Recipe, RecipeIngredientRow, RecipePayload, RecipeRow},
        validation::validate_recipe_payload,
    },
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Resolves a recipe for modification. Owners pass, admins pass, everyone
/// else gets a 403.
pub async fn get_recipe_mut(
    id: Id,
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
                    Err(RequestError::Unauthorized.default())
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(RequestError::InvalidRequest.new("No recipe exists with specified id")),
    }
}

pub async fn create_recipe(
    session: &SessionData,
    payload: RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<Id, Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_recipe_payload(&payload).map_err(|e| e.into())?;
    check_references(&payload, pool).await?;
    check_duplicate_name(session.user_id, &payload.name, None, pool).await?;

    let mut tx = pool.begin().await.map_err(|e| QueryError::from(e).into())?;

    let row: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id;
    ",
    )
    .bind(session.user_id)
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let recipe_id = row.0;
    insert_links(recipe_id, &payload, &mut tx).await?;

    tx.commit().await.map_err(|e| QueryError::from(e).into())?;

    Ok(recipe_id)
}

/// Updates a recipe in place. Ingredient amounts and tag links are replaced
/// wholesale inside the same transaction as the recipe row.
pub async fn update_recipe(
    id: Id,
    session: &SessionData,
    payload: RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;
    validate_recipe_payload(&payload).map_err(|e| e.into())?;
    check_references(&payload, pool).await?;
    check_duplicate_name(recipe.author_id, &payload.name, Some(id), pool).await?;

    let mut tx = pool.begin().await.map_err(|e| QueryError::from(e).into())?;

    sqlx::query(
        "UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_links(id, &payload, &mut tx).await?;

    tx.commit().await.map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn delete_recipe(id: Id, session: &SessionData, pool: &Pool<Postgres>) -> Result<(), Error> {
    get_recipe_mut(id, session, pool).await?;

    let mut tx = pool.begin().await.map_err(|e| QueryError::from(e).into())?;

    for table in ["recipe_ingredients", "recipe_tags", "favorites", "shopping_carts"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    tx.commit().await.map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn fetch_recipes(
    author: Option<Id>,
    tag_slug: Option<String>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let columns = "r.id, r.author_id, r.name, r.image, r.cooking_time, r.created_at, COUNT(*) OVER() AS count";

    let rows: Vec<RecipeRow> = match (author, tag_slug) {
        (Some(author), Some(slug)) => {
            sqlx::query_as(&format!(
                "
                SELECT {columns} FROM recipes r
                INNER JOIN recipe_tags rt ON rt.recipe_id = r.id
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE t.slug = $1 AND r.author_id = $2
                ORDER BY r.created_at DESC
                LIMIT $3 OFFSET $4
            "
            ))
            .bind(slug)
            .bind(author)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (Some(author), None) => {
            sqlx::query_as(&format!(
                "
                SELECT {columns} FROM recipes r
                WHERE r.author_id = $1
                ORDER BY r.created_at DESC
                LIMIT $2 OFFSET $3
            "
            ))
            .bind(author)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (None, Some(slug)) => {
            sqlx::query_as(&format!(
                "
                SELECT {columns} FROM recipes r
                INNER JOIN recipe_tags rt ON rt.recipe_id = r.id
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE t.slug = $1
                ORDER BY r.created_at DESC
                LIMIT $2 OFFSET $3
            "
            ))
            .bind(slug)
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
        (None, None) => {
            sqlx::query_as(&format!(
                "
                SELECT {columns} FROM recipes r
                ORDER BY r.created_at DESC
                LIMIT $1 OFFSET $2
            "
            ))
            .bind(RECIPE_COUNT_PER_PAGE)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?
        }
    };

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page)
}

pub async fn list_recipe_ingredients(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredientRow>, Error> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Verifies every referenced tag and ingredient id exists before writing.
async fn check_references(payload: &RecipePayload, pool: &Pool<Postgres>) -> Result<(), Error> {
    if !payload.tags.is_empty() {
        let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
            .bind(&payload.tags)
            .fetch_one(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

        if found.0 != payload.tags.len() as i64 {
            return Err(ValidationError::invalid_field("Unknown tag in payload").into());
        }
    }

    let ingredient_ids: Vec<Id> = payload.ingredients.iter().map(|i| i.id).collect();
    let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(&ingredient_ids)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if found.0 != ingredient_ids.len() as i64 {
        return Err(ValidationError::invalid_field("Unknown ingredient in payload").into());
    }

    Ok(())
}

async fn check_duplicate_name(
    author_id: Id,
    name: &str,
    exclude: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let row: Option<(Id,)> = sqlx::query_as(
        "SELECT id FROM recipes WHERE author_id = $1 AND LOWER(name) = LOWER($2) AND id <> $3",
    )
    .bind(author_id)
    .bind(name)
    .bind(exclude.unwrap_or(-1))
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if row.is_some() {
        return Err(
            ValidationError::invalid_field("You already have a recipe with this name").into(),
        );
    }

    Ok(())
}

async fn insert_links(
    recipe_id: Id,
    payload: &RecipePayload,
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(payload.ingredients.iter(), |mut b, part| {
        b.push_bind(recipe_id).push_bind(part.id).push_bind(part.amount);
    });
    query_builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if !payload.tags.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query_builder.push_values(payload.tags.iter(), |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(*tag_id);
        });
        query_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    Ok(())
}
