pub mod auth;
pub mod problem;
pub mod shared;
