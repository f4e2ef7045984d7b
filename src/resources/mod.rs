//! Canvas resource models
//!
//! Each submodule defines the models for one area of the API and the
//! [`Canvas`](crate::Canvas) methods that list them. Only the fields this
//! crate relies on are typed; Canvas sends many more, which serde skips.

mod assignments;
mod courses;
mod files;
mod users;

pub use assignments::Assignment;
pub use courses::Course;
pub use files::{File, Folder, FolderEntries, FsEntry};
pub use users::User;
