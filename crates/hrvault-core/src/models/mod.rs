pub mod employee;
pub mod file;

pub use employee::{Employee, EmployeeUpdate};
pub use file::{FileMetadata, ImageInfo, StoredFile};
