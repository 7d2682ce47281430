//! Protocol message compiler.
//!
//! Loads message specifications into a [`spec::TypeRegistry`] and compiles
//! every type into a per-backend plan: target type names, read/write
//! statements per field, required imports and the switch dispatch table.

pub mod codegen;
pub mod spec;
