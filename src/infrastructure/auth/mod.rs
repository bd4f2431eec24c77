//! Authentication infrastructure - bearer session tokens

mod jwt;

pub use jwt::{JwtClaims, JwtConfig, JwtGenerator, JwtService};
