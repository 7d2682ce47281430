pub mod expr;
pub mod fields;
pub mod types;

pub use types::GoPrimitive;

/// plc4go flavoured rendering of the shared compiler hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoBackend;
