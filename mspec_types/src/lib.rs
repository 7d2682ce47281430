//! Message Spec Type Definitions
//!
//! This crate contains the data model for protocol message specifications:
//! type references, complex/enum/any-data type definitions, the field kinds a
//! complex type is built from, and the expression terms that fields use for
//! lengths, conditions and computed values. It is pure data with no file I/O
//! or code generation logic.

pub mod expr;
pub mod types;

// Re-export commonly used types at the crate root
pub use expr::*;
pub use types::*;
