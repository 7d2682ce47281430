/* Expression Compiler Tests
 *
 * Virtual fields expose the compiled serialize-side expression as their
 * accessor, so these tests declare one virtual field per construct and check
 * what each backend renders for it. Broken expressions live in their own
 * types so every failure stays isolated.
 */

use mspec_gen::codegen::c_gen::types::{INCLUDE_EVALUATION_HELPER, INCLUDE_MATH};
use mspec_gen::codegen::go_gen::types::{IMPORT_MATH, IMPORT_UTILS};
use mspec_gen::codegen::shared::GenerationErrorKind;
use mspec_gen::codegen::{generate_all, Backend, GenerationReport, GeneratorOptions};
use mspec_gen::spec::{SpecFile, TypeRegistry};

const CALC_SPEC: &str = r#"
protocol: demo
flavor: read-write
types:
  - enum-type:
      name: COTPProtocolClass
      type:
        simple:
          base-type: uint
          size-in-bits: 8
      values:
        - name: CLASS_0
          value: "0x00"
        - name: CLASS_1
          value: "0x10"

  - complex-type:
      name: Calc
      fields:
        - simple:
            name: a
            type:
              simple:
                base-type: uint
                size-in-bits: 16
        - simple:
            name: b
            type:
              simple:
                base-type: uint
                size-in-bits: 8
        - array:
            name: items
            type:
              simple:
                base-type: uint
                size-in-bits: 8
            loop-type: count
            loop-expression:
              variable:
                name: b
        - virtual:
            name: sum
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            value-expression:
              binary:
                op: "+"
                a:
                  variable:
                    name: a
                b:
                  literal:
                    numeric: 1
        - virtual:
            name: squared
            type:
              simple:
                base-type: uint
                size-in-bits: 32
            value-expression:
              binary:
                op: "^"
                a:
                  variable:
                    name: a
                b:
                  literal:
                    numeric: 2
        - virtual:
            name: shifted
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            value-expression:
              binary:
                op: "<<"
                a:
                  variable:
                    name: a
                b:
                  literal:
                    numeric: 2
        - virtual:
            name: protocolClass
            type:
              complex:
                name: COTPProtocolClass
            value-expression:
              ternary:
                op: if
                a:
                  binary:
                    op: ">"
                    a:
                      variable:
                        name: b
                    b:
                      literal:
                        numeric: 0
                b:
                  variable:
                    name: COTPProtocolClass
                    child:
                      name: CLASS_1
                c:
                  variable:
                    name: COTPProtocolClass
                    child:
                      name: CLASS_0
        - virtual:
            name: itemCount
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            value-expression:
              variable:
                name: COUNT
                args:
                  - variable:
                      name: items
        - virtual:
            name: castClass
            type:
              complex:
                name: COTPProtocolClass
            value-expression:
              variable:
                name: CAST
                args:
                  - variable:
                      name: b
                  - variable:
                      name: COTPProtocolClass
        - virtual:
            name: bits
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            value-expression:
              variable:
                name: STATIC_CALL
                args:
                  - literal:
                      string: utils.countBits
                  - variable:
                      name: a

  - complex-type:
      name: BadArity
      fields:
        - simple:
            name: b
            type:
              simple:
                base-type: uint
                size-in-bits: 8
        - virtual:
            name: cast
            type:
              complex:
                name: COTPProtocolClass
            value-expression:
              variable:
                name: CAST
                args:
                  - variable:
                      name: b

  - complex-type:
      name: BadCast
      fields:
        - simple:
            name: b
            type:
              simple:
                base-type: uint
                size-in-bits: 8
        - virtual:
            name: cast
            type:
              simple:
                base-type: uint
                size-in-bits: 8
            value-expression:
              variable:
                name: CAST
                args:
                  - variable:
                      name: b
                  - variable:
                      name: NoSuchType

  - complex-type:
      name: Unresolved
      fields:
        - virtual:
            name: broken
            type:
              simple:
                base-type: uint
                size-in-bits: 8
            value-expression:
              variable:
                name: missing

  - complex-type:
      name: LengthOnParse
      fields:
        - virtual:
            name: size
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            value-expression:
              variable:
                name: lengthInBits

  - complex-type:
      name: SelfLength
      fields:
        - implicit:
            name: len
            type:
              simple:
                base-type: uint
                size-in-bits: 16
            serialize-expression:
              binary:
                op: "+"
                a:
                  variable:
                    name: len
                b:
                  literal:
                    numeric: 1
"#;

/* Helper to compile the calculator spec for one backend */
fn generate(backend: Backend) -> Result<GenerationReport, String> {
    let file = SpecFile::from_yaml(CALC_SPEC).map_err(|e| format!("Failed to parse spec: {}", e))?;
    let registry =
        TypeRegistry::from_spec_files(&[file]).map_err(|e| format!("Failed to build registry: {}", e))?;
    let options = GeneratorOptions {
        backend,
        ..GeneratorOptions::default()
    };
    Ok(generate_all(&registry, &options))
}

fn accessor(report: &GenerationReport, field: &str) -> String {
    report
        .artifact("Calc")
        .and_then(|calc| calc.field(field))
        .and_then(|plan| plan.accessor.clone())
        .unwrap_or_else(|| panic!("no accessor for Calc.{}", field))
}

fn failure_kind(report: &GenerationReport, type_name: &str) -> GenerationErrorKind {
    report
        .failure(type_name)
        .map(|failure| failure.kind.clone())
        .unwrap_or_else(|| panic!("{} should fail", type_name))
}

#[test]
fn test_broken_types_do_not_stop_the_others() {
    for backend in [Backend::Go, Backend::C] {
        let report = generate(backend).expect("spec should load");
        assert_eq!(report.failures.len(), 5, "{:?}", report.failures);
        assert!(report.artifact("Calc").is_some());
        assert!(report.artifact("COTPProtocolClass").is_some());
    }
}

#[test]
fn test_go_arithmetic_converts_operands_to_field_type() {
    let report = generate(Backend::Go).expect("spec should load");
    assert!(accessor(&report, "sum").contains("uint16(m.A) + uint16(1)"));
}

#[test]
fn test_c_arithmetic_is_uncast() {
    let report = generate(Backend::C).expect("spec should load");
    assert_eq!(accessor(&report, "sum"), "(_message->a) + (1)");
}

#[test]
fn test_power_is_never_xor() {
    let go = generate(Backend::Go).expect("spec should load");
    let squared = accessor(&go, "squared");
    assert!(squared.contains("math.Pow(float64(m.A), float64(2))"));
    assert!(!squared.contains('^'));
    let calc = go.artifact("Calc").expect("Calc artifact");
    assert!(calc.imports.contains(IMPORT_MATH));

    let c = generate(Backend::C).expect("spec should load");
    let squared = accessor(&c, "squared");
    assert_eq!(squared, "((uint32_t) pow((_message->a), (2)))");
    let calc = c.artifact("Calc").expect("Calc artifact");
    assert!(calc.imports.contains(INCLUDE_MATH));
}

#[test]
fn test_bitwise_operands_are_not_cast() {
    let go = generate(Backend::Go).expect("spec should load");
    let shifted = accessor(&go, "shifted");
    assert!(shifted.contains("(m.A) << (2)"));
    assert!(!shifted.contains("uint16(m.A)"));

    let c = generate(Backend::C).expect("spec should load");
    assert_eq!(accessor(&c, "shifted"), "(_message->a) << (2)");
}

#[test]
fn test_enum_ternary_goes_through_the_cast() {
    let go = generate(Backend::Go).expect("spec should load");
    assert_eq!(
        accessor(&go, "protocolClass"),
        "CastCOTPProtocolClass(utils.InlineIf(bool((m.B) > (0)), func() any {return COTPProtocolClass_CLASS_1}, func() any {return COTPProtocolClass_CLASS_0}))"
    );
    let calc = go.artifact("Calc").expect("Calc artifact");
    assert!(calc.imports.contains(IMPORT_UTILS));

    let c = generate(Backend::C).expect("spec should load");
    assert_eq!(
        accessor(&c, "protocolClass"),
        "((plc4c_demo_read_write_cotp_protocol_class) ((((_message->b) > (0)) ? plc4c_demo_read_write_cotp_protocol_class_CLASS_1 : plc4c_demo_read_write_cotp_protocol_class_CLASS_0)))"
    );
}

#[test]
fn test_built_ins() {
    let go = generate(Backend::Go).expect("spec should load");
    assert!(accessor(&go, "itemCount").contains("uint16(len(m.Items))"));
    assert_eq!(accessor(&go, "castClass"), "CastCOTPProtocolClass(m.B)");
    assert!(accessor(&go, "bits").contains("CountBits(m.A)"));

    let c = generate(Backend::C).expect("spec should load");
    assert_eq!(
        accessor(&c, "itemCount"),
        "plc4c_spi_evaluation_helper_count(_message->items)"
    );
    assert_eq!(
        accessor(&c, "castClass"),
        "((plc4c_demo_read_write_cotp_protocol_class) (_message->b))"
    );
    assert_eq!(accessor(&c, "bits"), "plc4c_demo_read_write_count_bits(_message->a)");
    let calc = c.artifact("Calc").expect("Calc artifact");
    assert!(calc.imports.contains(INCLUDE_EVALUATION_HELPER));
}

#[test]
fn test_built_in_arity_is_checked() {
    let report = generate(Backend::Go).expect("spec should load");
    assert_eq!(
        failure_kind(&report, "BadArity"),
        GenerationErrorKind::BuiltInArity {
            name: "CAST".to_string(),
            expected: "2",
            found: 1,
        }
    );
    let failure = report.failure("BadArity").expect("BadArity failure");
    assert_eq!(failure.field.as_deref(), Some("cast"));
}

#[test]
fn test_cast_to_unknown_type_is_ambiguous() {
    let report = generate(Backend::C).expect("spec should load");
    assert_eq!(
        failure_kind(&report, "BadCast"),
        GenerationErrorKind::AmbiguousCast("NoSuchType".to_string())
    );
}

#[test]
fn test_unresolved_name() {
    for backend in [Backend::Go, Backend::C] {
        let report = generate(backend).expect("spec should load");
        assert_eq!(
            failure_kind(&report, "Unresolved"),
            GenerationErrorKind::UnresolvedName("missing".to_string())
        );
    }
}

#[test]
fn test_length_is_unknown_while_parsing() {
    let report = generate(Backend::Go).expect("spec should load");
    let kind = failure_kind(&report, "LengthOnParse");
    assert!(
        matches!(&kind, GenerationErrorKind::UnsupportedConstruct(message) if message.contains("lengthInBits")),
        "unexpected {:?}",
        kind
    );
}

#[test]
fn test_self_referencing_implicit_field_is_a_cycle() {
    for backend in [Backend::Go, Backend::C] {
        let report = generate(backend).expect("spec should load");
        assert_eq!(
            failure_kind(&report, "SelfLength"),
            GenerationErrorKind::ImplicitCycle("len".to_string())
        );
    }
}
