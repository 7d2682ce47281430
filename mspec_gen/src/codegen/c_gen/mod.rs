pub mod expr;
pub mod fields;
pub mod types;

pub use types::{c_type_name, CPrimitive};

/// plc4c flavoured rendering of the shared compiler hooks. Discriminated
/// cases are flattened into the parse and serialize bodies of their root.
#[derive(Debug, Clone, Copy, Default)]
pub struct CBackend;
