use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    constants::USER_COUNT_PER_PAGE,
    database::{
        error::{Error, QueryError, RequestError, ValidationError},
        pagination::PageContext,
        schema::{Id, NewUser, User, UserRow},
        validation::{validate_new_user, validate_password},
    },
};

use sqlx::{Pool, Postgres};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Registers a user. The password is hashed before it touches the database;
/// a taken username is a client error, not a crash.
pub async fn register_user(payload: NewUser, pool: &Pool<Postgres>) -> Result<Id, Error> {
    let username = validate_new_user(&payload).map_err(|e| e.into())?;

    let password = hash_password(&payload.password)
        .map_err(|_| RequestError::InternalServerError.new("Failed to hash password"))?;

    let row: Option<(Id,)> = sqlx::query_as(
        "
        INSERT INTO users (username, email, first_name, last_name, password, role)
        VALUES ($1, $2, $3, $4, $5, 'user')
        ON CONFLICT DO NOTHING RETURNING id;
    ",
    )
    .bind(&username)
    .bind(&payload.email)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&password)
    .fetch_optional(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    match row {
        Some(row) => Ok(row.0),
        None => Err(ValidationError::invalid_field("Username is already taken").into()),
    }
}

pub async fn login_user(
    username: &str,
    password: &str,
    secret: &str,
    session_ttl_hours: i64,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let user = match get_user(pool, username).await? {
        Some(user) => user,
        None => return Err(RequestError::InvalidRequest.new("Invalid credentials")),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_| RequestError::InvalidRequest.new("Invalid credentials"))?;
    if !authenticated {
        return Err(RequestError::InvalidRequest.new("Invalid credentials"));
    }

    Ok(generate_jwt_session(&user, secret, session_ttl_hours))
}

pub async fn set_password(
    user_id: Id,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let user = match get_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Err(RequestError::InvalidRequest.new("No user exists with specified id")),
    };

    let authenticated = verify_password(current_password, &user.password)
        .map_err(|_| RequestError::InvalidRequest.new("Invalid password"))?;
    if !authenticated {
        return Err(RequestError::InvalidRequest.new("Invalid password"));
    }

    validate_password(new_password).map_err(|e| e.into())?;
    let password = hash_password(new_password)
        .map_err(|_| RequestError::InternalServerError.new("Failed to hash password"))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(&password)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn fetch_users(offset: i64, pool: &Pool<Postgres>) -> Result<PageContext<UserRow>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id
        LIMIT $1 OFFSET $2
    ",
    )
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|u| u.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);

    Ok(page)
}
