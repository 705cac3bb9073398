//! Data models for Libris

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookShort};
pub use user::{Principal, Role, User};
