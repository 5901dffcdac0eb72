//! Authentication module for Campus Market
//!
//! - Account creation and login against the credential store
//! - JWT issuance and stateless verification
//! - bcrypt password hashing

mod jwt;
mod password;
mod service;

pub use jwt::{AuthenticatedIdentity, Claims, IdentityClaims, JwtError, TokenCodec};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AccountError, AccountService, LoginSuccess};
