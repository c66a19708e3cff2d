//! Database models split into domain-specific modules.

pub mod announcement;
pub mod course;
pub mod enrollment;
pub mod user;

pub use announcement::*;
pub use course::*;
pub use enrollment::*;
pub use user::*;
