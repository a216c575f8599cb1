#![deny(missing_docs)]

//! Various small functions to make working with Unreal data formats easier.

pub mod read_ext;
pub use read_ext::UnrealReadExt;

pub mod error;

pub mod guid;
pub use guid::Guid;
