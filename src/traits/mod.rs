//! Core traits for the resolution container.

mod dispose;

pub use dispose::Dispose;
