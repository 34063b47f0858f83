pub mod job;
pub mod manifest;
pub mod pin;

pub use job::*;
pub use manifest::*;
pub use pin::*;
