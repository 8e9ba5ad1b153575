pub mod problem;
pub mod role;
pub mod role_permission;
pub mod test_case;
pub mod user;
