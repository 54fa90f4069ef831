//! Branchtabs Session Management
//!
//! - A session is the ordered set of open files saved for one branch
//! - Sessions are keyed by branch name and persisted one file per branch
//! - A repository index records which branch names have sessions
//! - Sessions are never deleted; they accumulate with the storage directory

mod error;
mod record;
mod session;
mod store;

pub use error::SessionError;
pub use record::{IndexRecord, SessionRecord};
pub use session::BranchSession;
pub use store::{SavedSession, SessionStore, SharedSession};

pub type Result<T> = std::result::Result<T, SessionError>;
