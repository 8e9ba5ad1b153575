pub mod auth;
pub mod avatar;
pub mod health;
pub mod problem;
