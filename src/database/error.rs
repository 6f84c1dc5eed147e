use std::fmt::{self, Display};

use warp::reject::{Reject, Rejection};

/// Error surfaced to the HTTP layer: a status code plus a human-readable
/// message. Nothing in this crate panics on a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
}

impl Error {
    pub fn new(code: u16, info: &str) -> Self {
        Self {
            code,
            info: Some(info.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(f, "[{}] {}", self.code, info),
            None => write!(f, "[{}]", self.code),
        }
    }
}

impl std::error::Error for Error {}
impl Reject for Error {}

#[derive(Debug, Clone, Copy)]
pub enum RequestError {
    InvalidRequest,
    Unauthorized,
    InvalidSession,
    InternalServerError,
}

impl RequestError {
    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
        }
    }

    pub fn default(self) -> Error {
        Error {
            code: self.code(),
            info: None,
        }
    }

    fn code(self) -> u16 {
        match self {
            RequestError::InvalidRequest => 400,
            RequestError::InvalidSession => 401,
            RequestError::Unauthorized => 403,
            RequestError::InternalServerError => 500,
        }
    }
}

/// Client-side validation failures. All of these map to a 400 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateRelation,
    RelationNotFound,
    EmptyCart,
    InvalidField(String),
}

impl ValidationError {
    pub fn invalid_field(info: &str) -> Self {
        Self::InvalidField(info.to_string())
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateRelation => write!(f, "Relation already exists"),
            ValidationError::RelationNotFound => write!(f, "Relation does not exist"),
            ValidationError::EmptyCart => write!(f, "Shopping cart is empty"),
            ValidationError::InvalidField(info) => write!(f, "{info}"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Into<Error> for ValidationError {
    fn into(self) -> Error {
        Error {
            code: 400,
            info: Some(format!("{self}")),
        }
    }
}

pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        log::error!("query failed: {}", self.info);

        Error {
            code: 500,
            info: Some(self.info),
        }
    }
}

pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl CacheError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl Into<Error> for CacheError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Into<Error> for TypeError {
    fn into(self) -> Error {
        RequestError::InvalidRequest.new(&self.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

impl Into<Rejection> for TypeError {
    fn into(self) -> Rejection {
        warp::reject::custom(RequestError::InvalidRequest.new(&self.info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let cases = [
            ValidationError::DuplicateRelation,
            ValidationError::RelationNotFound,
            ValidationError::EmptyCart,
            ValidationError::invalid_field("Cooking time must be at least 1 minute"),
        ];

        for case in cases {
            let error: Error = case.into();
            assert_eq!(error.code, 400);
            assert!(error.info.is_some());
        }
    }

    #[test]
    fn invalid_field_keeps_its_message() {
        let error: Error = ValidationError::invalid_field("Tags must not repeat").into();
        assert_eq!(error.info.as_deref(), Some("Tags must not repeat"));
    }

    #[test]
    fn errors_surface_as_rejections() {
        let rejection = warp::reject::custom(RequestError::InvalidRequest.new("Bad payload"));
        let found = rejection.find::<Error>().unwrap();
        assert_eq!(found.code, 400);
    }

    #[test]
    fn request_error_codes() {
        assert_eq!(RequestError::InvalidRequest.default().code, 400);
        assert_eq!(RequestError::InvalidSession.default().code, 401);
        assert_eq!(RequestError::Unauthorized.default().code, 403);
        assert_eq!(RequestError::InternalServerError.default().code, 500);
    }
}
