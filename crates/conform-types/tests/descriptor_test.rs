use conform_types::{
    parse_signature, ConcreteTypeDescriptor, DescriptorError, InterfaceDescriptor, MemberKind,
    MethodSignature, Qualifiers, TypeRef, Value,
};

fn sig(text: &str) -> MethodSignature {
    parse_signature(text).unwrap()
}

#[test]
fn test_define_logger() {
    let iface = InterfaceDescriptor::define(
        "Logger",
        vec![sig("log(string) -> void"), sig("level() -> int readonly")],
    )
    .unwrap();

    assert_eq!(iface.name(), "Logger");
    assert_eq!(iface.len(), 2);
    let level = iface.resolve("level", &[]).unwrap();
    assert_eq!(iface.signature(level).unwrap().return_type, TypeRef::INT);
}

#[test]
fn test_duplicate_signature_rejected() {
    let err = InterfaceDescriptor::define(
        "Logger",
        vec![sig("log(string) -> void"), sig("log(string) -> int")],
    )
    .unwrap_err();

    assert_eq!(
        err,
        DescriptorError::DuplicateSignature {
            owner: "Logger".to_string(),
            signature: "log(string) -> int".to_string(),
        }
    );
}

#[test]
fn test_overloads_on_qualifiers_are_distinct() {
    let iface = InterfaceDescriptor::define(
        "Buffer",
        vec![sig("data() -> bytes"), sig("data() -> bytes readonly")],
    )
    .unwrap();

    assert_eq!(iface.group("data").unwrap().len(), 2);
    // same parameters, two qualifier variants: plain resolve refuses to pick
    assert!(iface.resolve("data", &[]).is_none());
    let ro = iface
        .resolve_exact("data", &[], Qualifiers::READ_ONLY)
        .unwrap();
    assert_eq!(ro.index(), 1);
}

#[test]
fn test_disallowed_members() {
    let cases = vec![
        (
            MethodSignature::new("init").with_kind(MemberKind::Constructor),
            MemberKind::Constructor,
        ),
        (
            MethodSignature::new("size").with_kind(MemberKind::Field),
            MemberKind::Field,
        ),
        (
            MethodSignature::new("map").with_kind(MemberKind::GenericMethod),
            MemberKind::GenericMethod,
        ),
        (MethodSignature::new("operator"), MemberKind::Operator),
        (MethodSignature::new("Shape"), MemberKind::Constructor),
    ];

    for (member, kind) in cases {
        let name = member.name.clone();
        let err = InterfaceDescriptor::define("geo::Shape", vec![member]).unwrap_err();
        assert_eq!(
            err,
            DescriptorError::DisallowedMember {
                owner: "geo::Shape".to_string(),
                name,
                kind,
            }
        );
    }
}

#[test]
fn test_operator_prefixed_names_are_methods() {
    let iface = InterfaceDescriptor::define(
        "Dispatcher",
        vec![
            sig("operators() -> int"),
            sig("operator_count() -> int readonly"),
        ],
    )
    .unwrap();
    assert_eq!(iface.len(), 2);
    assert!(iface.group("operators").is_some());
}

#[test]
fn test_invalid_names() {
    assert!(matches!(
        InterfaceDescriptor::define("", Vec::<MethodSignature>::new()),
        Err(DescriptorError::InvalidName { .. })
    ));
    assert!(matches!(
        InterfaceDescriptor::define("Logger", vec![MethodSignature::new("log-line")]),
        Err(DescriptorError::InvalidName { .. })
    ));
}

#[test]
fn test_default_must_match_parameter_type() {
    let bad = MethodSignature::new("log")
        .param(TypeRef::STRING)
        .param_with_default(TypeRef::INT, "high");
    let err = InterfaceDescriptor::define("Logger", vec![bad]).unwrap_err();
    assert!(matches!(
        err,
        DescriptorError::DefaultTypeMismatch { index: 1, .. }
    ));
}

#[test]
fn test_defaults_must_be_trailing() {
    let bad = MethodSignature::new("log")
        .param_with_default(TypeRef::INT, Value::Int(1))
        .param(TypeRef::STRING);
    let err = InterfaceDescriptor::define("Logger", vec![bad]).unwrap_err();
    assert!(matches!(
        err,
        DescriptorError::NonTrailingDefault { index: 1, .. }
    ));
}

#[test]
fn test_empty_interface_is_allowed() {
    let iface = InterfaceDescriptor::define("Marker", Vec::<MethodSignature>::new()).unwrap();
    assert!(iface.is_empty());
    assert_eq!(iface.slots().count(), 0);
}

#[test]
fn test_concrete_type_keeps_extra_methods() {
    let ty = ConcreteTypeDescriptor::new(
        "FileLogger",
        vec![
            sig("log(string) -> void"),
            sig("level() -> int readonly"),
            sig("rotate(int) -> bool"),
        ],
    )
    .unwrap();
    assert_eq!(ty.len(), 3);
    assert_eq!(ty.groups().len(), 3);
}

#[test]
fn test_concrete_duplicate_rejected() {
    let err = ConcreteTypeDescriptor::new(
        "FileLogger",
        vec![sig("log(string)"), sig("log(string) -> bool")],
    )
    .unwrap_err();
    assert!(matches!(err, DescriptorError::DuplicateSignature { .. }));
}
