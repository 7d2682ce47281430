/* Specification file loading */

use super::SpecError;
use mspec_types::TypeDefinition;
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_FLAVOR: &str = "read-write";

fn default_flavor() -> String {
    DEFAULT_FLAVOR.to_string()
}

/* One YAML specification file: a protocol header plus its type definitions */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct SpecFile {
    pub protocol: String,
    #[serde(default = "default_flavor")]
    pub flavor: String,
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub types: Vec<TypeDefinition>,
}

impl SpecFile {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let text = fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_yaml(&text).map_err(|source| SpecError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            protocol = %file.protocol,
            types = file.types.len(),
            "loaded specification file"
        );
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_defaults_to_read_write() {
        let file = SpecFile::from_yaml("protocol: s7\ntypes: []\n").expect("header should parse");
        assert_eq!(file.flavor, DEFAULT_FLAVOR);
        assert!(file.types.is_empty());
    }

    #[test]
    fn test_enum_type_parses() {
        let yaml = r#"
protocol: s7
types:
  - enum-type:
      name: MemoryArea
      type:
        simple:
          base-type: uint
          size-in-bits: 8
      constant-types:
        - name: shortName
          type:
            simple:
              base-type: string
              size-in-bits: 24
      values:
        - name: INPUTS
          value: "0x81"
          constants:
            shortName: I
"#;
        let file = SpecFile::from_yaml(yaml).expect("enum should parse");
        let TypeDefinition::EnumType(def) = &file.types[0] else {
            panic!("expected enum type");
        };
        assert_eq!(def.values[0].constants["shortName"], "I");
    }
}
