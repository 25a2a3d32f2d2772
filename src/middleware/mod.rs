pub mod admin;
pub mod auth;
pub mod security_headers;

pub use admin::AdminAuth;
pub use auth::AuthMiddleware;
pub use security_headers::SecurityHeaders;
