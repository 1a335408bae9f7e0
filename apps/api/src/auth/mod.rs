//! Registration, login and the session cookie that identifies the caller.

pub mod handlers;
pub mod password;
pub mod session;
pub mod store;

pub use session::CurrentUser;
