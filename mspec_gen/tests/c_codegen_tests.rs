/* C Code Generation Tests
 *
 * These tests compile the s7 fixture with the C backend. Discriminated cases
 * are flattened into their root type, so most checks look at the root's
 * switch field.
 */

use mspec_gen::codegen::c_gen::types::{INCLUDE_LIST, INCLUDE_STDINT, INCLUDE_STDIO};
use mspec_gen::codegen::shared::plan::{FieldPlan, TypeArtifact};
use mspec_gen::codegen::shared::GenerationErrorKind;
use mspec_gen::codegen::{generate_all, Backend, GenerationReport, GeneratorOptions};
use mspec_gen::spec::{SpecFile, TypeRegistry};
use std::path::Path;

const S7_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/s7.yaml");

/* Helper to build a registry from the s7 fixture */
fn load_s7() -> Result<TypeRegistry, String> {
    let file = SpecFile::load(Path::new(S7_FIXTURE)).map_err(|e| format!("Failed to load fixture: {}", e))?;
    TypeRegistry::from_spec_files(&[file]).map_err(|e| format!("Failed to build registry: {}", e))
}

fn c_options() -> GeneratorOptions {
    GeneratorOptions {
        backend: Backend::C,
        ..GeneratorOptions::default()
    }
}

/* Helper to compile the s7 fixture for C */
fn generate_s7() -> Result<GenerationReport, String> {
    let registry = load_s7()?;
    let report = generate_all(&registry, &c_options());
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

fn switch<'a>(artifact: &'a TypeArtifact) -> &'a FieldPlan {
    artifact
        .fields
        .iter()
        .find(|f| f.kind == "switch")
        .unwrap_or_else(|| panic!("no switch in {}", artifact.type_name))
}

#[test]
fn test_c_type_names_follow_plc4c_convention() {
    let report = generate_s7().expect("s7 should compile");

    assert_eq!(artifact(&report, "S7Message").target_type, "plc4c_s7_read_write_s7_message");
    assert_eq!(artifact(&report, "TPKTPacket").target_type, "plc4c_s7_read_write_tpkt_packet");
    assert_eq!(
        artifact(&report, "COTPProtocolClass").target_type,
        "plc4c_s7_read_write_cotp_protocol_class"
    );
}

#[test]
fn test_c_case_artifacts_point_at_their_root() {
    let report = generate_s7().expect("s7 should compile");

    let request = artifact(&report, "S7MessageRequest");
    assert_eq!(request.target_type, "plc4c_s7_read_write_s7_message");
    assert_eq!(request.parent.as_deref(), Some("S7Message"));
    assert!(request.fields.is_empty());
}

#[test]
fn test_c_odd_width_uses_covering_type_and_declared_bits() {
    let report = generate_s7().expect("s7 should compile");
    let s7 = artifact(&report, "S7Message");
    let data_length = field(s7, "dataLength");

    assert_eq!(data_length.target_type.as_deref(), Some("uint16_t"));
    assert!(data_length.read.contains("uint16_t dataLength = 0;"));
    assert!(data_length
        .read
        .contains("_res = plc4c_spi_read_unsigned_short(readBuffer, 12, (uint16_t*) &dataLength);"));
    assert!(data_length.read.contains("(*_message)->data_length = dataLength;"));
    assert!(data_length
        .write
        .contains("plc4c_spi_write_unsigned_short(writeBuffer, 12, _message->data_length)"));
    assert_eq!(data_length.length_in_bits.as_deref(), Some("lengthInBits += 12;"));
    assert!(s7.imports.contains(INCLUDE_STDINT));
}

#[test]
fn test_c_const_field_checks_constant() {
    let report = generate_s7().expect("s7 should compile");
    let protocol_id = field(artifact(&report, "S7Message"), "protocolId");

    assert!(protocol_id
        .read
        .contains("if(protocolId != PLC4C_S7_READ_WRITE_S7_MESSAGE_PROTOCOL_ID) {"));
    assert!(protocol_id.read.contains(
        "fprintf(stderr, \"Expected constant value '%u' but got '%u' for field protocolId.\\n\", PLC4C_S7_READ_WRITE_S7_MESSAGE_PROTOCOL_ID, protocolId);"
    ));
    assert!(protocol_id.read.contains("return PARSE_ERROR;"));
    assert!(!protocol_id.read.contains("throw"));
    assert!(protocol_id.imports.contains(INCLUDE_STDIO));
    assert!(protocol_id
        .write
        .contains("plc4c_spi_write_unsigned_byte(writeBuffer, 8, PLC4C_S7_READ_WRITE_S7_MESSAGE_PROTOCOL_ID)"));
}

#[test]
fn test_c_reserved_field_reports_with_typed_format() {
    let report = generate_s7().expect("s7 should compile");
    let reserved = artifact(&report, "TPKTPacket")
        .fields
        .iter()
        .find(|f| f.kind == "reserved")
        .expect("TPKTPacket has a reserved field");

    assert!(reserved.read.contains("uint8_t _reserved = 0;"));
    assert!(reserved.read.contains("if(_reserved != 0x00) {"));
    assert!(reserved.read.contains(
        "fprintf(stderr, \"Expected constant value '%u' but got '%u' for reserved field.\\n\", 0x00, _reserved);"
    ));
}

#[test]
fn test_c_switch_cases_are_inlined_in_order() {
    let report = generate_s7().expect("s7 should compile");
    let s7 = artifact(&report, "S7Message");
    let switch = switch(s7);

    let request = switch
        .read
        .find("if((messageType) == (0x01)) { /* S7MessageRequest */")
        .expect("first case opens the chain");
    let response = switch
        .read
        .find("} else if((messageType) == (0x03)) { /* S7MessageResponse */")
        .expect("second case continues the chain");
    assert!(request < response);
    assert!(switch.read.contains(
        "(*_message)->_type = plc4c_s7_read_write_s7_message_type_plc4c_s7_read_write_s7_message_request;"
    ));
    assert!(switch
        .read
        .contains("fprintf(stderr, \"Unmapped type for parameters [messageType=%d]\\n\", messageType);"));

    /* case fields are prefixed members of the root struct */
    assert!(switch.read.contains("(*_message)->s7_message_request_items = items;"));
    assert!(switch.read.contains("uint16_t itemCount = (uint16_t) dataLength;"));
    assert!(switch
        .read
        .contains("plc4c_spi_read_string(readBuffer, (dataLength) * (8), \"UTF-8\", (char**) &note)"));

    assert!(switch.write.contains("switch(_message->_type) {"));
    assert!(switch
        .write
        .contains("case plc4c_s7_read_write_s7_message_type_plc4c_s7_read_write_s7_message_response: {"));
    assert!(switch
        .write
        .contains("plc4c_spi_write_unsigned_byte(writeBuffer, 8, _message->s7_message_response_error_code)"));

    let length = switch.length_in_bits.as_deref().expect("switch length");
    assert!(length.contains("lengthInBits += 8 * plc4c_utils_list_size(_message->s7_message_request_items);"));

    assert_eq!(switch.target_type.as_deref(), Some("plc4c_s7_read_write_s7_message_type"));
    let dispatch = s7.dispatch().expect("dispatch table");
    assert_eq!(dispatch.cases[2].target_type, "plc4c_s7_read_write_s7_message_user_data");
    assert_eq!(dispatch.cases[2].condition.as_deref(), Some("(messageType) == (0x07)"));

    assert!(switch.imports.contains(INCLUDE_STDIO));
    assert!(s7.imports.contains(INCLUDE_LIST));
}

#[test]
fn test_c_optional_scalar_is_allocated_and_null_check_is_not_dereferenced() {
    let report = generate_s7().expect("s7 should compile");
    let s7 = artifact(&report, "S7Message");

    let error_class = field(s7, "errorClass");
    assert_eq!(error_class.target_type.as_deref(), Some("uint8_t*"));
    assert!(error_class.read.contains("uint8_t* errorClass = NULL;"));
    assert!(error_class.read.contains("if((messageType) == (0x03)) {"));
    assert!(error_class.read.contains("errorClass = malloc(sizeof(uint8_t));"));
    assert!(error_class.write.contains("if((_message->error_class) != (NULL)) {"));
    assert!(error_class
        .write
        .contains("plc4c_spi_write_unsigned_byte(writeBuffer, 8, (*_message->error_class))"));

    let has_error = field(s7, "hasError");
    assert_eq!(has_error.accessor.as_deref(), Some("(_message->error_class) != (NULL)"));
    assert!(has_error.read.contains("bool hasError = (errorClass) != (NULL);"));
}

#[test]
fn test_c_enum_field_in_inlined_case() {
    let report = generate_s7().expect("s7 should compile");
    let cotp = artifact(&report, "COTPPacket");
    let switch = switch(cotp);

    assert!(switch.read.contains(
        "plc4c_s7_read_write_cotp_protocol_class protocolClass = plc4c_s7_read_write_cotp_protocol_class_null();"
    ));
    assert!(switch
        .read
        .contains("plc4c_s7_read_write_cotp_protocol_class_parse(readBuffer, (void*) &protocolClass)"));

    let enumeration = artifact(&report, "COTPProtocolClass");
    assert_eq!(
        enumeration.enum_constants[0].target_name,
        "plc4c_s7_read_write_cotp_protocol_class_CLASS_0"
    );
}

#[test]
fn test_c_position_and_implicit_length() {
    let report = generate_s7().expect("s7 should compile");

    let cotp = artifact(&report, "COTPPacket");
    let payload = field(cotp, "payload");
    assert!(payload
        .read
        .contains("if(((plc4c_spi_read_get_pos(readBuffer) - startPos)) < (cotpLen)) {"));
    assert!(cotp.requires_start_pos);

    let tpkt = artifact(&report, "TPKTPacket");
    let len = field(tpkt, "len");
    assert!(len.write.contains(
        "plc4c_spi_write_unsigned_short(writeBuffer, 16, (plc4c_s7_read_write_tpkt_packet_length_in_bytes(_message)) + (4))"
    ));
    let payload = field(tpkt, "payload");
    assert_eq!(payload.target_type.as_deref(), Some("plc4c_s7_read_write_cotp_packet*"));
    assert!(payload
        .read
        .contains("plc4c_s7_read_write_cotp_packet_parse(readBuffer, (len) - (4), (void*) &payload)"));
}

#[test]
fn test_c_protocol_override_renames_types() {
    let registry = load_s7().expect("fixture should load");
    let options = GeneratorOptions {
        protocol: Some("s7plus".to_string()),
        ..c_options()
    };
    let report = generate_all(&registry, &options);
    assert!(report.is_success());
    assert_eq!(report.protocol, "s7plus");
    assert_eq!(artifact(&report, "S7Message").target_type, "plc4c_s7plus_read_write_s7_message");
}

#[test]
fn test_c_float_128_fails_with_field_named() {
    let yaml = r#"
protocol: demo
types:
  - complex-type:
      name: Measurement
      fields:
        - simple:
            name: value
            type:
              simple:
                base-type: float
                size-in-bits: 128
"#;
    let file = SpecFile::from_yaml(yaml).expect("yaml should parse");
    let registry = TypeRegistry::from_spec_files(&[file]).expect("registry");

    let report = generate_all(&registry, &c_options());
    assert!(!report.is_success());
    let failure = report.failure("Measurement").expect("Measurement should fail");
    assert_eq!(failure.field.as_deref(), Some("value"));
    assert_eq!(
        failure.kind,
        GenerationErrorKind::UnmappableWidth {
            backend: "c",
            kind: "float".to_string(),
            bits: 128,
        }
    );
    assert!(failure.to_string().contains("field value"));

    /* Go falls back to big.Float */
    let report = generate_all(&registry, &GeneratorOptions::default());
    assert!(report.is_success());
    let value = field(artifact(&report, "Measurement"), "value");
    assert_eq!(value.target_type.as_deref(), Some("*big.Float"));
}

#[test]
fn test_c_failure_in_case_names_the_case() {
    let yaml = r#"
protocol: demo
types:
  - complex-type:
      name: Frame
      fields:
        - discriminator:
            name: kind
            type:
              simple:
                base-type: uint
                size-in-bits: 8
        - switch:
            discriminators:
              - name: kind
            cases:
              - name: FrameWide
                values:
                  - value:
                      numeric: 1
                fields:
                  - simple:
                      name: huge
                      type:
                        simple:
                          base-type: uint
                          size-in-bits: 128
"#;
    let file = SpecFile::from_yaml(yaml).expect("yaml should parse");
    let registry = TypeRegistry::from_spec_files(&[file]).expect("registry");

    let report = generate_all(&registry, &c_options());
    let failure = report.failure("FrameWide").expect("case failure");
    assert_eq!(failure.field.as_deref(), Some("huge"));
    assert!(report.artifact("Frame").is_none());
}
