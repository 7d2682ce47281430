/* Generation-time errors
 *
 * A generation error aborts the type being compiled. Other types of the same
 * run keep compiling.
 */

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationErrorKind {
    #[error("unsupported primitive kind '{0}'")]
    UnsupportedPrimitive(String),

    #[error("{backend} has no mapping for {kind} with {bits} bits")]
    UnmappableWidth {
        backend: &'static str,
        kind: String,
        bits: u32,
    },

    #[error("unresolved name '{0}'")]
    UnresolvedName(String),

    #[error("built-in {name} expects {expected} argument(s), got {found}")]
    BuiltInArity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("ambiguous cast target '{0}'")]
    AmbiguousCast(String),

    #[error("case '{case}' gives {values} value(s) for {discriminators} discriminator(s)")]
    MissingDiscriminator {
        case: String,
        values: usize,
        discriminators: usize,
    },

    #[error("'{0}' is referenced before it is read")]
    NotYetRead(String),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("implicit field '{0}' is defined in terms of itself")]
    ImplicitCycle(String),

    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} [type {type_name}{}, at {construct}]", field_suffix(.field))]
pub struct GenerationError {
    pub type_name: String,
    pub field: Option<String>,
    pub construct: String,
    pub kind: GenerationErrorKind,
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(name) => format!(", field {}", name),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_type_and_field() {
        let err = GenerationError {
            type_name: "S7Payload".into(),
            field: Some("value".into()),
            construct: "float 128".into(),
            kind: GenerationErrorKind::UnmappableWidth {
                backend: "c",
                kind: "float".into(),
                bits: 128,
            },
        };
        let message = err.to_string();
        assert!(message.contains("S7Payload"));
        assert!(message.contains("field value"));
        assert!(message.contains("128 bits"));
    }
}
