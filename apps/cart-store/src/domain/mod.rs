//! Domain Layer
//!
//! Pure business types. Nothing in here performs I/O.

pub mod cart;
