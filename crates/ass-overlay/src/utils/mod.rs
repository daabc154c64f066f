//! Utility types and helper functions

mod errors;
pub mod text;
pub mod uuencode;

pub use errors::OverlayError;
