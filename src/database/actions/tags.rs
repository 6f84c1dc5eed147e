use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    cache::cache::{delete_cache_value, get_or, CacheKeyType},
    constants::CATALOG_CACHE_TTL,
    database::{
        error::{Error, QueryError, ValidationError},
        schema::{Id, Tag},
    },
};

use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};

pub async fn create_tag(
    session: &SessionData,
    name: &str,
    color: &str,
    slug: &str,
    cache: &mut MultiplexedConnection,
    pool: &Pool<Postgres>,
) -> Result<Id, Error> {
    session.authenticate(ActionType::ManageTags)?;

    let row: Option<(Id,)> = sqlx::query_as(
        "
        INSERT INTO tags (name, color, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let id = match row {
        Some(row) => row.0,
        None => {
            return Err(
                ValidationError::invalid_field("Tag name, color and slug must be unique").into(),
            )
        }
    };

    delete_cache_value(CacheKeyType::Tag.new("catalog"), cache).await?;

    Ok(id)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, Error> {
    let row: Option<(Id,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Read-through cached tag catalog. The catalog is tiny and read on nearly
/// every recipe render, so it lives in redis between writes.
pub async fn list_tags_cached(
    cache: &mut MultiplexedConnection,
    pool: &Pool<Postgres>,
) -> Result<Vec<Tag>, Error> {
    get_or(
        CacheKeyType::Tag.new("catalog"),
        CATALOG_CACHE_TTL,
        cache,
        list_tags(pool),
    )
    .await
}

pub async fn list_recipe_tags(recipe_id: Id, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}
