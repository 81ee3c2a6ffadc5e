/*
 * Responsibility
 * - Request filters, each exposed as `apply(router, ...) -> Router`
 * - Every filter either passes the request on (`next.run`) or ends it with an AppError
 * - role::apply installs auth itself; the other filters are independent
 */
pub mod auth;
pub mod cors;
pub mod lang;
pub mod maintenance;
pub mod role;
