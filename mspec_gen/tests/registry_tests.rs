/* Type Registry Tests
 *
 * These tests verify loading of specification files into the registry:
 * switch cases registered as child types, declaration order, and the
 * errors raised for inconsistent input.
 */

use mspec_gen::spec::{SpecError, SpecFile, TypeRegistry};
use mspec_types::TypeDefinition;
use std::path::Path;

const S7_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/s7.yaml");

/* Helper to load the s7 fixture */
fn load_s7() -> Result<TypeRegistry, String> {
    let file = SpecFile::load(Path::new(S7_FIXTURE)).map_err(|e| format!("Failed to load fixture: {}", e))?;
    TypeRegistry::from_spec_files(&[file]).map_err(|e| format!("Failed to build registry: {}", e))
}

fn spec(yaml: &str) -> SpecFile {
    SpecFile::from_yaml(yaml).expect("specification should parse")
}

#[test]
fn test_fixture_loads_with_case_children() {
    let registry = load_s7().expect("fixture should load");

    assert_eq!(registry.protocol(), "s7");
    assert_eq!(registry.flavor(), "read-write");

    /* 4 declared types plus 3 + 3 switch cases */
    assert_eq!(registry.len(), 10);

    let data = registry.complex("COTPPacketData").expect("case should be registered");
    assert_eq!(data.parent.as_deref(), Some("COTPPacket"));
    assert_eq!(data.fields.len(), 2);

    let user_data = registry.complex("S7MessageUserData").expect("case should be registered");
    assert_eq!(registry.root_of(user_data).name, "S7Message");
    assert!(registry.complex("S7Message").expect("root").is_abstract());
    assert!(registry.enumeration("COTPProtocolClass").is_some());
}

#[test]
fn test_cases_follow_their_parent_in_iteration_order() {
    let registry = load_s7().expect("fixture should load");
    let names: Vec<&str> = registry.iter().map(TypeDefinition::name).collect();

    let position = |name: &str| names.iter().position(|n| *n == name).expect("type present");
    assert!(position("COTPPacket") < position("COTPPacketData"));
    assert_eq!(position("COTPPacketData") + 1, position("COTPPacketConnectionRequest"));
    assert!(position("COTPPacketTpduError") < position("S7Message"));

    let children: Vec<&str> = registry
        .children_of("S7Message")
        .iter()
        .map(|child| child.name.as_str())
        .collect();
    assert_eq!(children, vec!["S7MessageRequest", "S7MessageResponse", "S7MessageUserData"]);
}

#[test]
fn test_duplicate_type_across_files_rejected() {
    let a = spec("protocol: demo\ntypes:\n  - any-data-type:\n      name: DataItem\n");
    let b = spec("protocol: demo\ntypes:\n  - any-data-type:\n      name: DataItem\n");

    match TypeRegistry::from_spec_files(&[a, b]) {
        Err(SpecError::DuplicateType(name)) => assert_eq!(name, "DataItem"),
        other => panic!("expected duplicate type error, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_protocol_mismatch_rejected() {
    let a = spec("protocol: s7\ntypes: []\n");
    let b = spec("protocol: modbus\ntypes: []\n");

    match TypeRegistry::from_spec_files(&[a, b]) {
        Err(SpecError::ProtocolMismatch { found, expected }) => {
            assert_eq!(found, "modbus");
            assert_eq!(expected, "s7");
        }
        other => panic!("expected protocol mismatch, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_unknown_parent_rejected() {
    let file = spec(
        r#"
protocol: demo
types:
  - complex-type:
      name: Orphan
      parent: Missing
"#,
    );
    let err = TypeRegistry::from_spec_files(&[file]).expect_err("unknown parent should fail");
    assert!(matches!(err, SpecError::UnknownParent { ref parent, .. } if parent == "Missing"));
    assert!(err.to_string().contains("Orphan"));
}

#[test]
fn test_no_files_is_an_error() {
    assert!(matches!(TypeRegistry::from_spec_files(&[]), Err(SpecError::Empty)));
}

#[test]
fn test_missing_file_reports_path() {
    let err = SpecFile::load(Path::new("does/not/exist.yaml")).expect_err("missing file should fail");
    assert!(matches!(err, SpecError::Io { .. }));
    assert!(err.to_string().contains("exist.yaml"));
}

#[test]
fn test_naming_override() {
    let registry = load_s7()
        .expect("fixture should load")
        .with_naming(Some("s7plus".to_string()), None);
    assert_eq!(registry.protocol(), "s7plus");
    assert_eq!(registry.flavor(), "read-write");
}
