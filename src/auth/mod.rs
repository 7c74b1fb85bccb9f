//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtService};
pub use middleware::{
    extract_bearer_token, extract_session_token, jwt_auth_middleware, optional_session_middleware,
    session_auth_middleware, AuthContext,
};
pub use password::PasswordHasher;
