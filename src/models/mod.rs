pub mod entry;
pub mod tag;

pub use entry::{Entry, NewEntry};
pub use tag::Tag;
