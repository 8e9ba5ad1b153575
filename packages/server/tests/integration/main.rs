mod auth;
mod common;
mod health;
mod problem;
