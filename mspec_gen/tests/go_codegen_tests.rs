/* Go Code Generation Tests
 *
 * These tests compile the s7 fixture with the Go backend and check the
 * rendered plc4go statements, imports and dispatch of each type.
 */

use mspec_gen::codegen::go_gen::types::{IMPORT_API_VALUES, IMPORT_ERRORS, IMPORT_LOG};
use mspec_gen::codegen::shared::plan::{FieldPlan, TypeArtifact};
use mspec_gen::codegen::{generate_all, Backend, GenerationReport, GeneratorOptions};
use mspec_gen::spec::{SpecFile, TypeRegistry};
use std::path::Path;

const S7_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/s7.yaml");

/* Helper to compile the s7 fixture for Go */
fn generate_s7() -> Result<GenerationReport, String> {
    let file = SpecFile::load(Path::new(S7_FIXTURE)).map_err(|e| format!("Failed to load fixture: {}", e))?;
    let registry =
        TypeRegistry::from_spec_files(&[file]).map_err(|e| format!("Failed to build registry: {}", e))?;
    let options = GeneratorOptions {
        backend: Backend::Go,
        ..GeneratorOptions::default()
    };
    let report = generate_all(&registry, &options);
    if !report.is_success() {
        let failures: Vec<String> = report.failures.iter().map(|f| f.to_string()).collect();
        return Err(format!("Generation failed:\n{}", failures.join("\n")));
    }
    Ok(report)
}

fn artifact<'r>(report: &'r GenerationReport, name: &str) -> &'r TypeArtifact {
    report
        .artifact(name)
        .unwrap_or_else(|| panic!("no artifact for {}", name))
}

fn field<'a>(artifact: &'a TypeArtifact, name: &str) -> &'a FieldPlan {
    artifact
        .field(name)
        .unwrap_or_else(|| panic!("no field {} in {}", name, artifact.type_name))
}

#[test]
fn test_go_whole_fixture_compiles() {
    let report = generate_s7().expect("s7 should compile");
    assert_eq!(report.artifacts.len(), 10);
    assert_eq!(report.protocol, "s7");

    /* registry order is kept even though types compile in parallel */
    let names: Vec<&str> = report.artifacts.iter().map(|a| a.type_name.as_str()).collect();
    assert_eq!(names[0], "COTPProtocolClass");
    assert_eq!(names[1], "TPKTPacket");
    assert_eq!(names[2], "COTPPacket");
    assert_eq!(names[3], "COTPPacketData");
}

#[test]
fn test_go_odd_width_uses_covering_type_and_declared_bits() {
    let report = generate_s7().expect("s7 should compile");
    let data_length = field(artifact(&report, "S7Message"), "dataLength");

    assert_eq!(data_length.target_type.as_deref(), Some("uint16"));
    assert!(data_length.read.contains("readBuffer.ReadUint16(\"dataLength\", 12)"));
    assert!(data_length.write.contains("writeBuffer.WriteUint16(\"dataLength\", 12, (dataLength))"));
    assert_eq!(data_length.length_in_bits.as_deref(), Some("lengthInBits += 12"));

    let tpdu_ref = field(artifact(&report, "COTPPacketData"), "tpduRef");
    assert_eq!(tpdu_ref.target_type.as_deref(), Some("uint8"));
    assert!(tpdu_ref.read.contains("readBuffer.ReadUint8(\"tpduRef\", 7)"));
}

#[test]
fn test_go_const_and_reserved_fields() {
    let report = generate_s7().expect("s7 should compile");
    let tpkt = artifact(&report, "TPKTPacket");

    let protocol_id = field(tpkt, "protocolId");
    assert!(protocol_id.read.contains("if protocolId != TPKTPacket_PROTOCOLID {"));
    assert!(protocol_id.write.contains("WriteUint8(\"protocolId\", 8, TPKTPacket_PROTOCOLID)"));
    assert_eq!(protocol_id.accessor.as_deref(), Some("0x03"));

    let reserved = tpkt.fields.iter().find(|f| f.kind == "reserved").expect("reserved field");
    assert!(reserved.name.is_none());
    assert!(reserved.read.contains("if reserved != uint8(0x00) {"));
    assert!(reserved.imports.contains(IMPORT_LOG));
    assert!(tpkt.imports.contains(IMPORT_ERRORS));
    assert!(tpkt.imports.contains(IMPORT_LOG));
}

#[test]
fn test_go_implicit_field_recomputed_on_serialize() {
    let report = generate_s7().expect("s7 should compile");
    let tpkt = artifact(&report, "TPKTPacket");

    let len = field(tpkt, "len");
    assert!(len.read.contains("len, lenErr := readBuffer.ReadUint16(\"len\", 16)"));
    assert!(len.write.contains("uint16(m.LengthInBytes()) + uint16(4)"));

    /* the parse side sees the value that was just read */
    let payload = field(tpkt, "payload");
    assert!(payload.read.contains("COTPPacketParse(readBuffer, (len) - (4))"));
    assert!(payload.write.contains("Serialize(writeBuffer)"));
}

#[test]
fn test_go_optional_scalar_is_pointer_and_null_check_is_not_dereferenced() {
    let report = generate_s7().expect("s7 should compile");
    let s7 = artifact(&report, "S7Message");

    let error_class = field(s7, "errorClass");
    assert_eq!(error_class.target_type.as_deref(), Some("*uint8"));
    assert!(error_class.read.contains("var errorClass *uint8 = nil"));
    assert!(error_class.read.contains("if bool((messageType) == (0x03)) {"));
    assert!(error_class.read.contains("errorClass = &_val"));
    assert!(error_class.write.contains("if bool((m.ErrorClass) != (nil)) {"));

    let has_error = field(s7, "hasError");
    let accessor = has_error.accessor.as_deref().expect("virtual accessor");
    assert!(accessor.contains("(m.ErrorClass) != (nil)"));
    assert!(!accessor.contains("*m.ErrorClass"));
    assert!(has_error.read.contains("(errorClass) != (nil)"));
}

#[test]
fn test_go_optional_complex_with_position_condition() {
    let report = generate_s7().expect("s7 should compile");
    let cotp = artifact(&report, "COTPPacket");

    let payload = field(cotp, "payload");
    assert_eq!(payload.target_type.as_deref(), Some("S7Message"));
    assert!(payload.read.contains("if bool(((readBuffer.GetPos() - startPos)) < (cotpLen)) {"));
    assert!(payload.read.contains("S7MessageParse(readBuffer)"));
    assert!(payload.requires_start_pos);
    assert!(cotp.requires_start_pos);
    assert!(!artifact(&report, "TPKTPacket").requires_start_pos);
}

#[test]
fn test_go_switch_dispatch_in_declaration_order() {
    let report = generate_s7().expect("s7 should compile");
    let cotp = artifact(&report, "COTPPacket");
    let dispatch = cotp.dispatch().expect("COTPPacket switches");

    assert_eq!(dispatch.discriminators, vec!["tpduCode".to_string()]);
    let names: Vec<&str> = dispatch.cases.iter().map(|c| c.type_name.as_str()).collect();
    assert_eq!(names, vec!["COTPPacketData", "COTPPacketConnectionRequest", "COTPPacketTpduError"]);
    assert_eq!(dispatch.cases[0].values, vec![Some("0xF0".to_string())]);
    assert_eq!(dispatch.cases[0].condition.as_deref(), Some("bool((tpduCode) == (0xF0))"));
    assert_eq!(dispatch.cases[0].arguments, vec!["cotpLen".to_string()]);

    let switch = cotp.fields.iter().find(|f| f.kind == "switch").expect("switch field");
    assert!(switch.read.contains("case bool((tpduCode) == (0xF0)): // COTPPacketData"));
    assert!(switch.read.contains("_child, typeSwitchError = COTPPacketDataParse(readBuffer, cotpLen)"));
    assert!(switch.read.contains("\"Unmapped type for parameters [tpduCode=%v]\", tpduCode"));
    assert_eq!(switch.target_type.as_deref(), Some("COTPPacketChild"));
}

#[test]
fn test_go_switch_forwards_parent_fields() {
    let report = generate_s7().expect("s7 should compile");
    let s7 = artifact(&report, "S7Message");
    let dispatch = s7.dispatch().expect("S7Message switches");

    assert_eq!(
        dispatch.cases[0].forwarded,
        vec!["tpduReference".to_string(), "dataLength".to_string(), "errorClass".to_string()]
    );
    let switch = s7.fields.iter().find(|f| f.kind == "switch").expect("switch field");
    assert!(switch.read.contains("_child.InitializeParent(_child, tpduReference, dataLength, errorClass)"));
}

#[test]
fn test_go_case_types_see_parent_fields() {
    let report = generate_s7().expect("s7 should compile");

    let user_data = artifact(&report, "S7MessageUserData");
    assert_eq!(user_data.parent.as_deref(), Some("S7Message"));
    let note = field(user_data, "note");
    assert_eq!(note.target_type.as_deref(), Some("string"));
    assert!(note.read.contains("readBuffer.ReadString(\"note\", uint32((dataLength) * (8)), \"UTF-8\")"));

    let request = artifact(&report, "S7MessageRequest");
    let items = field(request, "items");
    assert_eq!(items.target_type.as_deref(), Some("[]uint8"));
    assert!(items.read.contains("items := make([]uint8, int(dataLength))"));
    assert!(items.write.contains("for _curItem, _element := range m.Items {"));
    assert_eq!(
        items.length_in_bits.as_deref(),
        Some("// Array field (items)\nlengthInBits += 8 * uint16(len(m.Items))")
    );
}

#[test]
fn test_go_enum_typed_field_and_constants() {
    let report = generate_s7().expect("s7 should compile");

    let request = artifact(&report, "COTPPacketConnectionRequest");
    let protocol_class = field(request, "protocolClass");
    assert_eq!(protocol_class.target_type.as_deref(), Some("COTPProtocolClass"));
    assert!(protocol_class.read.contains("COTPProtocolClassParse(readBuffer)"));
    assert_eq!(protocol_class.length_in_bits.as_deref(), Some("lengthInBits += 8"));

    let enumeration = artifact(&report, "COTPProtocolClass");
    let names: Vec<&str> = enumeration.enum_constants.iter().map(|c| c.target_name.as_str()).collect();
    assert_eq!(names, vec!["COTPProtocolClass_CLASS_0", "COTPProtocolClass_CLASS_1", "COTPProtocolClass_CLASS_4"]);
    assert_eq!(enumeration.enum_constants[1].value, "0x10");
}

#[test]
fn test_enum_constant_tables_can_be_left_out() {
    let file = SpecFile::load(Path::new(S7_FIXTURE)).expect("fixture should load");
    let registry = TypeRegistry::from_spec_files(&[file]).expect("registry should build");
    for backend in [Backend::Go, Backend::C] {
        let options = GeneratorOptions {
            backend,
            emit_enum_constants: false,
            ..GeneratorOptions::default()
        };
        let report = generate_all(&registry, &options);
        assert!(report.is_success(), "{:?}", report.failures);
        let enumeration = artifact(&report, "COTPProtocolClass");
        assert!(enumeration.enum_constants.is_empty());
    }
}

#[test]
fn test_go_any_data_type_maps_to_plc_value() {
    let file = SpecFile::from_yaml(
        r#"
protocol: demo
types:
  - any-data-type:
      name: DataItem
      parser-arguments:
        - name: numberOfValues
          type:
            simple:
              base-type: uint
              size-in-bits: 16
  - complex-type:
      name: Holder
      fields:
        - simple:
            name: item
            type:
              complex:
                name: DataItem
                params:
                  - literal:
                      numeric: 1
"#,
    )
    .expect("yaml should parse");
    let registry = TypeRegistry::from_spec_files(&[file]).expect("registry");
    let report = generate_all(&registry, &GeneratorOptions::default());
    assert!(report.is_success(), "{:?}", report.failures);

    let data_item = artifact(&report, "DataItem");
    assert_eq!(data_item.target_type, "apiValues.PlcValue");
    assert!(data_item.imports.contains(IMPORT_API_VALUES));
    assert_eq!(data_item.arguments[0].target_type.name, "uint16");

    let holder = artifact(&report, "Holder");
    let item = field(holder, "item");
    assert_eq!(item.target_type.as_deref(), Some("apiValues.PlcValue"));
    assert!(item.read.contains("DataItemParse(readBuffer, 1)"));
}
