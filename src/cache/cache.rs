use std::future::Future;

use chrono::Local;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::database::error::{CacheError, Error};

// Caching - keys

#[derive(Serialize, Clone, Debug)]
pub struct CacheKey<T: ToString + Serialize> {
    _value: T,
    _type: CacheKeyType,
}

impl<T: ToString + Serialize> CacheKey<T> {
    pub fn from(r#type: CacheKeyType, key: T) -> Self {
        Self {
            _value: key,
            _type: r#type,
        }
    }

    pub fn to_string(&self) -> String {
        self.into()
    }
}

impl<T: ToString + Serialize> Into<String> for &CacheKey<T> {
    fn into(self) -> String {
        match &self._type {
            CacheKeyType::Tag => format!("tag-{}", self._value.to_string()),
            CacheKeyType::Ingredient => format!("ingredient-{}", self._value.to_string()),
            CacheKeyType::Custom(_) => self._value.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum CacheKeyType {
    Tag,
    Ingredient,
    Custom(String),
}

impl CacheKeyType {
    pub fn new<T: ToString + Serialize>(self, key: T) -> CacheKey<T> {
        CacheKey::from(self, key)
    }
}

// Cache - values

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone, Debug)]
pub struct CachedValue<T: Serialize + Send + Sync + Clone> {
    pub value: T,
    stored_at: i64,
}

pub async fn get_cache_value<T>(
    key: String,
    cache: &mut MultiplexedConnection,
) -> Result<Option<CachedValue<T>>, Error>
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
{
    let value: Option<CachedValue<T>> = cache
        .get(&key)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(value)
}

pub async fn set_cache_value<T>(
    key: String,
    value: CachedValue<T>,
    ttl: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
{
    cache
        .set_ex::<String, CachedValue<T>, ()>(key, value, ttl)
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(())
}

pub async fn delete_cache_value<K: ToString + Serialize>(
    key: CacheKey<K>,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    cache
        .del::<String, ()>(key.to_string())
        .await
        .map_err(|e| CacheError::from(e).into())?;

    Ok(())
}

/// Read-through wrapper: serve the cached value when present, otherwise run
/// the fetch, cache its result with a TTL, and return it. A corrupt cache
/// entry falls back to the fetch instead of failing the request.
pub async fn get_or<T, K, Fut>(
    key: CacheKey<K>,
    ttl: u64,
    cache: &mut MultiplexedConnection,
    fetch: Fut,
) -> Result<T, Error>
where
    K: ToString + Serialize,
    T: Serialize + DeserializeOwned + Send + Sync + Clone + 'static,
    Fut: Future<Output = Result<T, Error>>,
{
    let cached: Option<CachedValue<T>> = match get_cache_value(key.to_string(), cache).await {
        Ok(value) => value,
        Err(e) => {
            log::error!("> Failed to read cached value {} ({e})", key.to_string());
            None
        }
    };

    if let Some(cached) = cached {
        log::trace!("> Found {}", key.to_string());
        return Ok(cached.value);
    }

    log::trace!("> Fetching {}", key.to_string());
    let value = fetch.await?;

    let wrapped = CachedValue {
        value: value.clone(),
        stored_at: Local::now().timestamp(),
    };

    // Write back off the request path; a failed write only costs a cache miss.
    let mut cache = cache.clone();
    let cache_key = key.to_string();
    tokio::spawn(async move {
        if let Err(e) = set_cache_value(cache_key.clone(), wrapped, ttl, &mut cache).await {
            log::error!("> Failed to cache {cache_key} ({e})");
        }
    });

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_type() {
        assert_eq!(CacheKeyType::Tag.new("catalog").to_string(), "tag-catalog");
        assert_eq!(
            CacheKeyType::Ingredient.new(42).to_string(),
            "ingredient-42"
        );
        assert_eq!(
            CacheKeyType::Custom(String::from("raw")).new("global-state").to_string(),
            "global-state"
        );
    }
}
