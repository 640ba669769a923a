pub mod authorizer;
pub mod jwks;
pub mod validator;

pub use authorizer::Authorizer;
pub use jwks::{JwksClient, JwksError, SigningKeySet};
pub use validator::{AuthError, TokenValidator, ValidateError};
