//! Structural rules applied to every scanned file.

pub mod circular_dependencies;
pub mod deep_relative_imports;
pub mod swallowed_errors;
