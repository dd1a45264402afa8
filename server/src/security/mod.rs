pub mod audit;
pub mod codec;
pub mod password;
pub mod signer;
pub mod token;

pub use audit::SessionAudit;
pub use password::AdminCredential;
pub use signer::KeyRing;
pub use token::{Rejection, SessionTokenService, TokenError};
