pub mod claims;
pub mod token;

pub use claims::{IdentityClaims, Role};
pub use token::{Identity, AUTH_TOKEN_COOKIE};
