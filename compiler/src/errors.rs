//! Error types shared by every compiler pass.
//!
//! Each pass works over [`LocatedError`] under its own name so call sites
//! read as "a parse error", "a type error", and so on, while sharing one
//! `Display`/`Error` implementation — the same shape as the teacher's
//! `CodeGenError`, minus the extra `Format` arm: no pass here wraps a
//! `std::fmt::Error` the way LLVM-IR text assembly does.

use pebble_core::SourceLocation;
use std::fmt;

#[derive(Debug, Clone)]
pub struct LocatedError {
    pub location: SourceLocation,
    pub message: String,
}

impl LocatedError {
    pub fn new(location: SourceLocation, message: impl Into<String>) -> Self {
        LocatedError {
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for LocatedError {}

pub type ParseError = LocatedError;
pub type TypeError = LocatedError;
pub type InterpretError = LocatedError;
pub type IrError = LocatedError;
