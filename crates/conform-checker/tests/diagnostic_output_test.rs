//! Integration tests for diagnostic output

use codespan_reporting::files::SimpleFiles;
use conform_checker::{create_files, is_compatible, Diagnostic, ErrorCode};
use conform_types::{parse_signature, ConcreteTypeDescriptor, InterfaceDescriptor, MethodSignature};

fn sigs(texts: &[&str]) -> Vec<MethodSignature> {
    texts.iter().map(|t| parse_signature(t).unwrap()).collect()
}

#[test]
fn test_mismatch_diagnostics() {
    let iface = InterfaceDescriptor::define(
        "Logger",
        sigs(&["log(string) -> void", "level() -> int readonly"]),
    )
    .unwrap();
    let ty = ConcreteTypeDescriptor::new("FileLogger", sigs(&["level() -> float readonly"])).unwrap();

    let compat = is_compatible(&iface, &ty);
    let diags = Diagnostic::from_compatibility(&compat);

    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].code(), Some(&ErrorCode("E0101")));
    assert_eq!(diags[1].code(), Some(&ErrorCode("E0103")));

    let files = SimpleFiles::new();
    let text = diags[0].render(&files);
    assert!(text.contains("error[E0101]"));
    assert!(text.contains("log(string) -> void"));
    assert!(text.contains("FileLogger"));

    let text = diags[1].render(&files);
    assert!(text.contains("returns `float`, expected `int`"));
}

#[test]
fn test_parse_error_points_at_token() {
    let source = "log(string) fast";
    let error = parse_signature(source).unwrap_err();
    let files = create_files("signature", source);

    let text = Diagnostic::from_parse_error(&error, 0, source).render(&files);
    assert!(text.contains("error[E0010]"));
    assert!(text.contains("signature:1:13"));
    assert!(text.contains("expected a qualifier"));
}

#[test]
fn test_descriptor_error_json() {
    let error = InterfaceDescriptor::define(
        "Logger",
        sigs(&["log(string)", "log(string) -> int"]),
    )
    .unwrap_err();

    let json = Diagnostic::from_descriptor_error(&error)
        .to_json(&SimpleFiles::new())
        .unwrap();
    assert!(json.contains("\"E0001\""));
    assert!(json.contains("\"labels\": []"));
}
