mod claims;
mod extractors;
mod jwt;

pub use claims::Claims;
pub use extractors::{AuthUser, RequestContext};
pub use jwt::JwtKeys;
