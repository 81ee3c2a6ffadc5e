/*
 * Responsibility
 * - v1 entry point (re-export routes())
 */
pub mod handlers;
mod routes;

pub use routes::routes;
