pub mod auth;
pub mod lang;
pub mod maintenance;
