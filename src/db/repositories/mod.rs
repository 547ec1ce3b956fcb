pub mod bookmark;
pub mod session;
pub mod user;
