pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod shopping;
pub mod tags;
pub mod users;
