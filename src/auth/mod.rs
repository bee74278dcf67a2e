//! Authentication and session management

pub mod directory;
pub mod request;
pub mod session;
pub mod ticket;
pub mod tiers;

pub use directory::{MemoryDirectory, UserDirectory, UserRecord};
pub use request::{CookieWrite, RequestContext};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use tiers::{AuthSession, CredentialMatch, FailureHandler, Handling, BAD_CREDENTIALS};
