//! Branchtabs Tab State
//!
//! One open file as it is persisted for a branch: path, cursor line,
//! text/binary classification and pin flag. Values are captured fresh from
//! the editor and never mutated in place.

mod error;
mod state;
mod tab;

pub use error::TabError;
pub use state::DocumentKind;
pub use tab::TabState;

pub type Result<T> = std::result::Result<T, TabError>;
