//! Shared utilities

pub mod diagnostic;
pub mod name;

pub use diagnostic::Diagnostic;
pub use name::Name;
