use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    database::{
        actions::{recipes::get_recipe, users::get_user_by_id},
        error::{Error, QueryError, ValidationError},
        pagination::PageContext,
        schema::{Id, RecipeRow, RelationKind, User},
    },
};

use sqlx::{Pool, Postgres};

/// Inserts an (owner, target) pair for the given relation kind. A pair that
/// already exists is a client error; concurrent duplicate inserts are resolved
/// by the unique constraint on the relation table.
pub async fn create_relation(
    kind: RelationKind,
    owner_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    check_target(kind, owner_id, target_id, pool).await?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING;",
        kind.table(),
        kind.owner_column(),
        kind.target_column()
    ))
    .bind(owner_id)
    .bind(target_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_outcome(result.rows_affected()).map_err(|e| e.into())?;

    Ok(())
}

/// Removes an (owner, target) pair. Deleting a pair that was never created is
/// a client error.
pub async fn delete_relation(
    kind: RelationKind,
    owner_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        kind.table(),
        kind.owner_column(),
        kind.target_column()
    ))
    .bind(owner_id)
    .bind(target_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    delete_outcome(result.rows_affected()).map_err(|e| e.into())?;

    Ok(())
}

/// `ON CONFLICT DO NOTHING` swallows the duplicate; zero inserted rows means
/// the pair was already there.
fn insert_outcome(rows_affected: u64) -> Result<(), ValidationError> {
    if rows_affected == 0 {
        return Err(ValidationError::DuplicateRelation);
    }

    Ok(())
}

fn delete_outcome(rows_affected: u64) -> Result<(), ValidationError> {
    if rows_affected == 0 {
        return Err(ValidationError::RelationNotFound);
    }

    Ok(())
}

pub async fn relation_exists(
    kind: RelationKind,
    owner_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let row: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT {} FROM {} WHERE {} = $1 AND {} = $2",
        kind.target_column(),
        kind.table(),
        kind.owner_column(),
        kind.target_column()
    ))
    .bind(owner_id)
    .bind(target_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(row.is_some())
}

pub async fn is_favorited(recipe_id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<bool, Error> {
    relation_exists(RelationKind::Favorite, user_id, recipe_id, pool).await
}

pub async fn is_in_shopping_cart(
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    relation_exists(RelationKind::ShoppingCart, user_id, recipe_id, pool).await
}

pub async fn fetch_favorites(
    user_id: Id,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.author_id, r.name, r.image, r.cooking_time, r.created_at, COUNT(*) OVER() AS count
        FROM favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        WHERE f.user_id = $1
        ORDER BY r.created_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page)
}

/// Authors the user follows.
pub async fn list_subscriptions(user_id: Id, pool: &Pool<Postgres>) -> Result<Vec<User>, Error> {
    let list: Vec<User> = sqlx::query_as(
        "
        SELECT u.* FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.subscriber_id = $1
        ORDER BY u.username
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

async fn check_target(
    kind: RelationKind,
    owner_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    match kind {
        RelationKind::Favorite | RelationKind::ShoppingCart => {
            if get_recipe(target_id, pool).await?.is_none() {
                return Err(
                    ValidationError::invalid_field("No recipe exists with specified id").into(),
                );
            }
        }
        RelationKind::Subscription => {
            if owner_id == target_id {
                return Err(
                    ValidationError::invalid_field("You cannot subscribe to yourself").into(),
                );
            }
            if get_user_by_id(pool, target_id).await?.is_none() {
                return Err(
                    ValidationError::invalid_field("No user exists with specified id").into(),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_is_rejected() {
        assert_eq!(insert_outcome(0), Err(ValidationError::DuplicateRelation));
        assert_eq!(insert_outcome(1), Ok(()));
    }

    #[test]
    fn deleting_an_absent_relation_is_rejected() {
        assert_eq!(delete_outcome(0), Err(ValidationError::RelationNotFound));
        assert_eq!(delete_outcome(1), Ok(()));
    }
}
