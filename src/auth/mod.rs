pub mod jwt;

pub use jwt::{AuthUser, Claims, JwtManager};
