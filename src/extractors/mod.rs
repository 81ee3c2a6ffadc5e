/*!
 * Request-context extractors
 *
 * Responsibility:
 * - Give handlers typed access to what the middleware left in request extensions
 * - Claims come from `middleware::auth`, the language tag from `middleware::lang`
 *
 * Public API:
 * - RequestClaims (optional claims, never rejects)
 * - Authenticated (claims or 401)
 * - RequestLang (negotiated tag, English if negotiation did not run)
 */

mod claims;
mod lang;

pub use claims::{Authenticated, RequestClaims};
pub use lang::RequestLang;
