//! Session management.
//!
//! - `Session`: session file persisted by the front end between runs
//! - `SessionHandle`: shared, in-process view of the current session used to
//!   gate mutations and attach the bearer token
//!
//! Establishing a session (login) is handled by the web auth flow; the client
//! only consumes the issued token.

pub mod session;

pub use session::{Session, SessionData, SessionHandle};
