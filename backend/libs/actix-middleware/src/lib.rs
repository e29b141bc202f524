//! # Actix Middleware Library
//!
//! Authentication and request correlation middleware for the HTTP edge
//!
//! ## Modules
//! - `jwt_auth`: bearer token authentication middleware
//! - `correlation_id`: request id minting and propagation
//! - `logging`: request/response logging
//!
//! ## Ordering
//! Authentication must run before request id minting. actix applies the last
//! `wrap` first:
//!
//! ```rust,ignore
//! web::scope("")
//!     .wrap(RequestIdMiddleware)
//!     .wrap(JwtAuthMiddleware::new(verifier))
//! ```

pub mod correlation_id;
pub mod jwt_auth;
pub mod logging;

pub use correlation_id::{RequestContext, RequestIdMiddleware};
pub use jwt_auth::{AuthRejection, AuthenticatedUser, JwtAuthMiddleware};
pub use logging::Logging;
