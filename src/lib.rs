mod database {
    pub mod actions;
    pub mod error;
    pub mod pagination;
    pub mod schema;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;

mod cache {
    pub mod cache;
}

pub use authentication::*;
pub use cache::cache::*;
pub use config::*;
pub use constants::*;
pub use database::*;
