// End-to-end conversion tests: source text through parser, rewrite and renderer

use std::io::Write;
use std::process::{Command, Stdio};
use symlogic_cli::{convert, convert_tree, ConvertError, Converter, DriverConfig};
use symlogic_core::{
    authorize_tree, is_fully_rewritten, BinOp, CmpOp, NodeKind, Operator, TransformError,
};
use symlogic_parser::{ParseError, DEFAULT_MAX_DEPTH};

fn unsupported_construct(source: &str) -> NodeKind {
    match convert(source) {
        Err(ConvertError::Transform(TransformError::UnsupportedConstruct(kind))) => kind,
        other => panic!("Expected unsupported construct for {:?}, got {:?}", source, other),
    }
}

fn unsupported_operator(source: &str) -> Operator {
    match convert(source) {
        Err(ConvertError::Transform(TransformError::UnsupportedOperator(op))) => op,
        other => panic!("Expected unsupported operator for {:?}, got {:?}", source, other),
    }
}

#[test]
fn test_sample_expressions() {
    let cases = [
        ("not a and (b == 0)", "And(Not(a), Eq(b, 0))"),
        ("a or (b < 0) or (0 <= c <= 10)", "Or(a, b < 0, And(0 <= c, c <= 10))"),
        ("a or b or c", "Or(a, b, c)"),
        ("0 <= c <= 10", "And(0 <= c, c <= 10)"),
        ("b == 0", "Eq(b, 0)"),
        ("a != b", "Ne(a, b)"),
        ("x >= 1", "x >= 1"),
        ("-x < 2", "-x < 2"),
        ("f(a and b, k=not c)", "f(And(a, b), k=Not(c))"),
    ];

    for (source, expected) in cases {
        assert_eq!(convert(source).unwrap(), expected, "{}", source);
    }
}

#[test]
fn test_nested_boolean_operations() {
    assert_eq!(convert("(a or b) and not (c or d)").unwrap(), "And(Or(a, b), Not(Or(c, d)))");
    assert_eq!(convert("(a and b) and c").unwrap(), "And(And(a, b), c)");
}

#[test]
fn test_arithmetic_is_preserved() {
    assert_eq!(convert("a + b * 2 == c ** 2").unwrap(), "Eq(a + b * 2, c ** 2)");
    assert_eq!(convert("(a - b) / 2 > 0").unwrap(), "(a - b) / 2 > 0");
    assert_eq!(convert("x % 2 == 0 or x // 3 != 1").unwrap(), "Or(Eq(x % 2, 0), Ne(x // 3, 1))");
}

#[test]
fn test_calls_are_rewritten_inside() {
    assert_eq!(convert("Abs(x == 1)").unwrap(), "Abs(Eq(x, 1))");
    assert_eq!(convert("f(x, **opts) > 0").unwrap(), "f(x, **opts) > 0");
    assert_eq!(unsupported_construct("f(**{})"), NodeKind::Dict);
}

#[test]
fn test_literals_are_opaque() {
    assert_eq!(convert("'a' == 1.5").unwrap(), "Eq('a', 1.5)");
    assert_eq!(convert("True and None").unwrap(), "And(True, None)");
}

#[test]
fn test_unsupported_constructs() {
    assert_eq!(unsupported_construct("[x for x in y]"), NodeKind::ListComp);
    assert_eq!(unsupported_construct("a.b == 1"), NodeKind::Attribute);
    assert_eq!(unsupported_construct("a[0]"), NodeKind::Subscript);
    assert_eq!(unsupported_construct("a if b else c"), NodeKind::IfExp);
    assert_eq!(unsupported_construct("lambda x: x"), NodeKind::Lambda);
    assert_eq!(unsupported_construct("(a, b)"), NodeKind::Tuple);
    assert_eq!(unsupported_construct("f(*a)"), NodeKind::Starred);
}

#[test]
fn test_unsupported_operators() {
    assert_eq!(unsupported_operator("a & b"), Operator::Binary(BinOp::BitAnd));
    assert_eq!(unsupported_operator("a | b"), Operator::Binary(BinOp::BitOr));
    assert_eq!(unsupported_operator("a @ b"), Operator::Binary(BinOp::MatMult));
    assert_eq!(unsupported_operator("a is b"), Operator::Compare(CmpOp::Is));
    assert_eq!(unsupported_operator("a not in b"), Operator::Compare(CmpOp::NotIn));
}

#[test]
fn test_first_error_wins() {
    // The list is found before `in` is examined
    assert_eq!(unsupported_construct("a in [1, 2]"), NodeKind::List);
    // Left operand is rewritten first
    assert_eq!(unsupported_operator("(a ^ b) == c.d"), Operator::Binary(BinOp::BitXor));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        convert("a & b").unwrap_err().to_string(),
        "Sympy does not support the BitAnd operator, so the transformation is impossible."
    );
    assert_eq!(convert("[x for x in y]").unwrap_err().to_string(), "ListComp node is not supported.");
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(convert("a and"), Err(ConvertError::Parse(ParseError::UnexpectedEof { .. }))));
    assert!(matches!(convert("a b"), Err(ConvertError::Parse(ParseError::UnexpectedToken { .. }))));
    assert!(matches!(convert("a $ b"), Err(ConvertError::Parse(ParseError::InvalidToken { .. }))));
}

#[test]
fn test_outputs_are_fully_rewritten() {
    for source in [
        "not a and (b == 0)",
        "a or (b < 0) or (0 <= c <= 10)",
        "a == b != c",
        "f(not a, k=(b or c))",
        "-(a + b) >= 0 and not not c",
    ] {
        let tree = convert_tree(source).unwrap();
        assert!(authorize_tree(&tree).is_ok(), "{}", source);
        assert!(is_fully_rewritten(&tree), "{}", source);
    }
}

#[test]
fn test_depth_limit() {
    let converter = Converter::new(DriverConfig {
        max_depth: 64,
        ..DriverConfig::default()
    });
    let nested = format!("{}a{}", "(".repeat(100), ")".repeat(100));
    assert!(matches!(
        converter.convert(&nested),
        Err(ConvertError::Parse(ParseError::TooDeep { limit: 64 }))
    ));

    let shallow = format!("{}a{}", "(".repeat(10), ")".repeat(10));
    assert_eq!(converter.convert(&shallow).unwrap(), "a");
}

#[test]
fn test_default_depth_converts() {
    let depth = DEFAULT_MAX_DEPTH - 1;
    let nested = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(convert(&nested).unwrap(), "a");

    // Every level is rewritten, so the rewrite and renderer recurse as deep
    let equalities = format!("{}a{}", "a == (".repeat(depth - 1), ")".repeat(depth - 1));
    let converted = convert(&equalities).unwrap();
    assert!(converted.starts_with("Eq(a, Eq(a, Eq(a, "));
    assert_eq!(converted.matches("Eq(").count(), depth - 1);

    let negations = format!("{}a", "not ".repeat(depth));
    assert_eq!(convert(&negations).unwrap().matches("Not(").count(), depth);
}

#[test]
fn test_long_chain_rejected() {
    let chain = vec!["a"; 300_000].join(" + ");
    assert!(matches!(
        convert(&chain),
        Err(ConvertError::Parse(ParseError::TooDeep { limit: DEFAULT_MAX_DEPTH }))
    ));

    let chain = vec!["a"; 300_000].join(" or ");
    assert!(convert(&chain).unwrap().starts_with("Or(a, a, a, "));
}

#[test]
fn test_integer_literals() {
    assert_eq!(convert("x < 99999999999999999999").unwrap(), "x < 99999999999999999999");
    assert_eq!(convert("-99999999999999999999 < x").unwrap(), "-99999999999999999999 < x");
    assert_eq!(convert("x == 0x10").unwrap(), "Eq(x, 16)");
    assert_eq!(convert("x != 0b11 + 0o7").unwrap(), "Ne(x, 3 + 7)");
    assert!(matches!(convert("x == 0123"), Err(ConvertError::Parse(ParseError::InvalidToken { .. }))));
}

#[test]
fn test_string_literals_render_like_python() {
    let cases = [
        (r"s == '\012'", r"Eq(s, '\n')"),
        (r"s == '\a'", r"Eq(s, '\x07')"),
        (r"s == r'\d'", r"Eq(s, '\\d')"),
        (r"s == '\777'", "Eq(s, '\u{1ff}')"),
        (r"s == b'a\x00'", r"Eq(s, b'a\x00')"),
        (r#"s == b"it's""#, r#"Eq(s, b"it's")"#),
    ];
    for (source, expected) in cases {
        assert_eq!(convert(source).unwrap(), expected, "{}", source);
    }
    assert!(matches!(
        convert(r"s == '\N{EM DASH}'"),
        Err(ConvertError::Parse(ParseError::InvalidToken { .. }))
    ));
}

#[test]
fn test_newlines() {
    assert!(matches!(
        convert("a or\nb"),
        Err(ConvertError::Parse(ParseError::UnexpectedToken { .. }))
    ));
    assert_eq!(convert("(a or\n b)").unwrap(), "Or(a, b)");
    assert_eq!(convert("a == b\n").unwrap(), "Eq(a, b)");
}

fn symlogic() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_symlogic"));
    command.env_remove("SYMLOGIC_CONFIG").env_remove("RUST_LOG");
    command
}

#[test]
fn test_binary_converts_arguments() {
    let output = symlogic().args(["not a and (b == 0)", "x >= 1"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "And(Not(a), Eq(b, 0))\nx >= 1\n");
}

#[test]
fn test_binary_reports_failures() {
    let output = symlogic().args(["a & b", "b == 0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Eq(b, 0)\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains(
        "error: Sympy does not support the BitAnd operator, so the transformation is impossible."
    ));
}

#[test]
fn test_binary_reads_stdin() {
    let mut child = symlogic()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a or b\n\nb != 0\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Or(a, b)\nNe(b, 0)\n");
}

#[test]
fn test_binary_rejects_long_chain() {
    let mut child = symlogic()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let chain = vec!["a"; 300_000].join(" + ");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(format!("{}\nb == 0\n", chain).as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Eq(b, 0)\n");
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("error: Expression is nested deeper than the limit of 100"));
}

#[test]
fn test_binary_check_and_json() {
    let output = symlogic().args(["--check", "a & b"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "ok\n");

    let output = symlogic().args(["--format", "json", "b == 0"]).output().unwrap();
    assert!(output.status.success());
    let tree: symlogic_core::Node = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree.to_string(), "Eq(b, 0)");
}
