/* Field Kind Tests
 *
 * Array loop policies and reserved-field checks on a small inline spec,
 * rendered by both backends.
 */

use mspec_gen::codegen::c_gen::types::{INCLUDE_STDIO, INCLUDE_STRING};
use mspec_gen::codegen::shared::plan::{FieldPlan, TypeArtifact};
use mspec_gen::codegen::{generate_all, Backend, GenerationReport, GeneratorOptions};
use mspec_gen::spec::{SpecFile, TypeRegistry};

const HOLDER_SPEC: &str = r#"
protocol: demo
flavor: read-write
types:
  - complex-type:
      name: Holder
      parser-arguments:
        - name: stop
          type:
            simple:
              base-type: bit
      fields:
        - simple:
            name: count
            type:
              simple:
                base-type: uint
                size-in-bits: 8
        - array:
            name: counted
            type:
              simple:
                base-type: uint
                size-in-bits: 8
            loop-type: count
            loop-expression:
              variable:
                name: count
        - simple:
            name: size
            type:
              simple:
                base-type: uint
                size-in-bits: 16
        - array:
            name: sized
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            loop-type: length
            loop-expression:
              variable:
                name: size
        - array:
            name: items
            type:
              simple:
                base-type: uint
                size-in-bits: 8
            loop-type: terminated
            loop-expression:
              variable:
                name: stop
        - reserved:
            type:
              simple:
                base-type: string
                size-in-bits: 16
            reference-value:
              string: ab
"#;

/* Helper to compile the holder spec for one backend */
fn generate(backend: Backend) -> GenerationReport {
    let file = SpecFile::from_yaml(HOLDER_SPEC).expect("spec should parse");
    let registry = TypeRegistry::from_spec_files(&[file]).expect("registry should build");
    let options = GeneratorOptions {
        backend,
        ..GeneratorOptions::default()
    };
    let report = generate_all(&registry, &options);
    assert!(report.is_success(), "{:?}", report.failures);
    report
}

fn holder(report: &GenerationReport) -> &TypeArtifact {
    report.artifact("Holder").expect("Holder artifact")
}

fn field<'a>(artifact: &'a TypeArtifact, name: &str) -> &'a FieldPlan {
    artifact
        .field(name)
        .unwrap_or_else(|| panic!("no field {} in {}", name, artifact.type_name))
}

fn reserved(artifact: &TypeArtifact) -> &FieldPlan {
    artifact
        .fields
        .iter()
        .find(|f| f.kind == "reserved")
        .expect("reserved field")
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in:\n{}", needle, haystack))
}

#[test]
fn test_go_terminated_array_checks_term_before_each_read() {
    let report = generate(Backend::Go);
    let items = field(holder(&report), "items");

    let check = position(&items.read, "for !bool(stop) {");
    let read = position(&items.read, "readBuffer.ReadUint8(\"items\", 8)");
    assert!(check < read);
    /* nothing is read ahead of the loop, so an empty array consumes no bytes */
    assert!(!items.read[..check].contains("readBuffer.Read"));
    assert!(!items.read.contains("lastItem = bool(stop)"));
    assert!(items.read.contains("items = append(items, _item)"));
}

#[test]
fn test_c_terminated_array_checks_term_before_each_read() {
    let report = generate(Backend::C);
    let items = field(holder(&report), "items");

    let check = position(&items.read, "while(!(stop)) {");
    let read = position(
        &items.read,
        "_res = plc4c_spi_read_unsigned_byte(readBuffer, 8, (uint8_t*) _value);",
    );
    assert!(check < read);
    assert!(!items.read[..check].contains("plc4c_spi_read_unsigned_byte"));
    assert!(!items.read.contains("lastItem = stop;"));
    assert!(items
        .read
        .contains("plc4c_utils_list_insert_head_value(items, _value);"));
}

#[test]
fn test_length_array_loops_until_end_position() {
    let go = generate(Backend::Go);
    let sized = field(holder(&go), "sized");
    assert!(sized.read.contains("_sizedLength := size"));
    assert!(sized
        .read
        .contains("_sizedEndPos := readBuffer.GetPos() + uint16(_sizedLength)"));
    let bound = position(&sized.read, "for readBuffer.GetPos() < _sizedEndPos {");
    assert!(bound < position(&sized.read, "readBuffer.ReadUint16(\"sized\", 16)"));

    let c = generate(Backend::C);
    let sized = field(holder(&c), "sized");
    assert!(sized.read.contains("uint16_t _sizedLength = size;"));
    assert!(sized
        .read
        .contains("uint16_t sizedEndPos = plc4c_spi_read_get_pos(readBuffer) + _sizedLength;"));
    let bound = position(
        &sized.read,
        "while(plc4c_spi_read_get_pos(readBuffer) < sizedEndPos) {",
    );
    assert!(bound < position(&sized.read, "plc4c_spi_read_unsigned_short(readBuffer, 16"));
}

#[test]
fn test_count_array_tracks_last_item() {
    let go = generate(Backend::Go);
    let counted = field(holder(&go), "counted");
    assert!(counted.read.contains("_numItems := int(count)"));
    assert!(counted.read.contains("lastItem := _curItem == (_numItems - 1)"));
    assert!(counted.write.contains("lastItem := _curItem == (len(m.Counted) - 1)"));

    let c = generate(Backend::C);
    let counted = field(holder(&c), "counted");
    assert!(counted.read.contains("uint16_t itemCount = (uint16_t) count;"));
    assert!(counted.read.contains("bool lastItem = curItem == (itemCount - 1);"));
    assert_eq!(
        counted.length_in_bits.as_deref(),
        Some("// Array field (counted)\nlengthInBits += 8 * plc4c_utils_list_size(_message->counted);")
    );
}

#[test]
fn test_c_string_reserved_field_compares_with_strcmp() {
    let report = generate(Backend::C);
    let plan = reserved(holder(&report));

    assert!(plan.read.contains("if(strcmp(_reserved, \"ab\") != 0) {"));
    assert!(plan.read.contains(
        "fprintf(stderr, \"Expected constant value '%s' but got '%s' for reserved field.\\n\", \"ab\", _reserved);"
    ));
    assert!(!plan.read.contains("_reserved != \"ab\""));
    assert!(plan.imports.contains(INCLUDE_STRING));
    assert!(plan.imports.contains(INCLUDE_STDIO));
}
