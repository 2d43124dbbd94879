//! Editor accounts, session tokens and the request gate.

pub mod accounts;
pub mod gate;
pub mod token;

pub use accounts::{Account, AccountStore};
pub use gate::require_auth;
pub use token::{Claims, TokenSigner};
