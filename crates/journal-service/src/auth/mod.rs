//! Bearer token authentication: JWKS cache, verifier, and claims.

pub mod claims;
pub mod jwks;
pub mod verifier;

pub use claims::Claims;
pub use jwks::JwksCache;
pub use verifier::TokenVerifier;
