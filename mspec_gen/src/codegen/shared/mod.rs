pub mod context;
pub mod dispatch;
pub mod errors;
pub mod expression;
pub mod fields;
pub mod imports;
pub mod naming;
pub mod plan;
pub mod resolver;
pub mod target;

pub use context::{Mode, TypeContext};
pub use errors::{GenerationError, GenerationErrorKind};
pub use imports::{Compiled, Imports};
pub use target::{TargetType, TypeMapper};
