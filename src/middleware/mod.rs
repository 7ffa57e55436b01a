mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{API_KEY_HEADER, api_key_auth};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, rate_limit};
