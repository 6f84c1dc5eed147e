use redis::aio::MultiplexedConnection;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::database::error::{CacheError, Error, QueryError, RequestError};

/// Environment-driven configuration for the SDK's external collaborators.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| RequestError::InternalServerError.new("DATABASE_URL is not set"))?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| RequestError::InternalServerError.new("JWT_SECRET is not set"))?;

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| String::from("redis://127.0.0.1/"));

        let session_ttl_hours = match std::env::var("SESSION_TTL_HOURS") {
            Ok(value) => value.parse().map_err(|_| {
                RequestError::InternalServerError.new("SESSION_TTL_HOURS must be an integer")
            })?,
            Err(_) => 1,
        };

        Ok(Self {
            database_url,
            redis_url,
            jwt_secret,
            session_ttl_hours,
        })
    }
}

pub async fn connect_pool(config: &Config) -> Result<Pool<Postgres>, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    log::info!("connected to postgres");

    Ok(pool)
}

pub async fn connect_cache(config: &Config) -> Result<MultiplexedConnection, Error> {
    let client = redis::Client::open(config.redis_url.as_str())
        .map_err(|e| CacheError::from(e).into())?;
    let connection = client
        .get_multiplexed_tokio_connection()
        .await
        .map_err(|e| CacheError::from(e).into())?;

    log::info!("connected to redis");

    Ok(connection)
}
