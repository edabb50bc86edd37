//! Authentication core: token cache, credential authenticator, session manager

pub mod authenticator;
pub mod cache;
pub mod session;
pub mod token;

pub use authenticator::Authenticator;
pub use cache::{CacheError, CacheResult, FileTokenCache, MemoryTokenCache, TokenCache};
pub use session::SessionManager;
pub use token::TokenRecord;
