//! Substitution resolution tests
//!
//! Covers plain, optional and self-referential substitutions, `+=`,
//! the environment fallback and the error cases.

use hocon_parser::{
    ChainedVariableHandler, HoconDocument, HoconError, HoconParserBuilder, IncludeKind,
    MapVariableHandler, ParseError, ParserConfig, ResolveError,
};
use pretty_assertions::assert_eq;

fn parse_with(text: &str, variables: &[(&str, &str)]) -> Result<HoconDocument, HoconError> {
    let mut handler = MapVariableHandler::new();
    for (name, value) in variables {
        handler.insert(*name, *value);
    }
    HoconParserBuilder::new(text)
        .with_variable_handler(Box::new(handler))
        .parse()
}

fn parse(text: &str) -> Result<HoconDocument, HoconError> {
    parse_with(text, &[])
}

#[test]
fn test_simple_references() {
    let document = parse(
        r#"
        host = example.com
        port = 8080
        url = "http://"${host}":"${port}/api
        copy = ${port}
        nested { value = ${host} }
    "#,
    )
    .unwrap();
    assert_eq!(document.get_string("url").unwrap(), "http://example.com:8080/api");
    assert_eq!(document.get_int("copy").unwrap(), 8080);
    assert_eq!(document.get_string("nested.value").unwrap(), "example.com");
}

#[test]
fn test_forward_references() {
    let document = parse("a = ${b}\nb = ${c}\nc = final").unwrap();
    assert_eq!(document.get_string("a").unwrap(), "final");
    assert_eq!(document.get_string("b").unwrap(), "final");
}

#[test]
fn test_reference_sees_final_value() {
    let document = parse("a = 1\nb = ${a}\na = 2").unwrap();
    assert_eq!(document.get_int("b").unwrap(), 2);
}

#[test]
fn test_object_substitution_and_merge() {
    let document = parse(
        r#"
        base { timeout = 10, retries = 3 }
        derived = ${base} { retries = 5 }
        alias = ${base}
    "#,
    )
    .unwrap();
    assert_eq!(document.get_int("derived.timeout").unwrap(), 10);
    assert_eq!(document.get_int("derived.retries").unwrap(), 5);
    assert_eq!(document.get_int("alias.retries").unwrap(), 3);
}

#[test]
fn test_array_concatenation_through_substitution() {
    let document = parse("base = [1, 2]\nall = ${base} [3]").unwrap();
    assert_eq!(document.get_int_list("all").unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_self_reference_uses_previous_value() {
    let document = parse("a = 1\na = ${a}").unwrap();
    assert_eq!(document.get_int("a").unwrap(), 1);

    let document = parse("path = /usr/bin\npath = ${path}\":/opt/bin\"").unwrap();
    assert_eq!(document.get_string("path").unwrap(), "/usr/bin:/opt/bin");

    let document = parse("obj { x = 1 }\nobj = ${obj} { y = 2 }").unwrap();
    assert_eq!(document.get_int("obj.x").unwrap(), 1);
    assert_eq!(document.get_int("obj.y").unwrap(), 2);
}

#[test]
fn test_self_reference_through_dotted_key() {
    let document = parse("a { b = 1 }\na.b = ${a.b}0").unwrap();
    assert_eq!(document.get_string("a.b").unwrap(), "10");
}

#[test]
fn test_plus_assignment() {
    let document = parse("list = [1]\nlist += 2\nlist += 3").unwrap();
    assert_eq!(document.get_int_list("list").unwrap(), vec![1, 2, 3]);

    let document = parse("fresh += first").unwrap();
    assert_eq!(document.get_string_list("fresh").unwrap(), vec!["first"]);

    let document = parse("objs += { id = 1 }\nobjs += { id = 2 }").unwrap();
    assert_eq!(document.get_object_list("objs").unwrap().len(), 2);
}

#[test]
fn test_optional_substitutions() {
    let document = parse("present = 5\na = ${?missing}\nb = ${?present}").unwrap();
    assert!(!document.has_path("a"));
    assert_eq!(document.get_int("b").unwrap(), 5);

    // An absent optional substitution keeps the earlier value
    let document = parse("timeout = 30\ntimeout = ${?TIMEOUT}").unwrap();
    assert_eq!(document.get_int("timeout").unwrap(), 30);

    let document = parse_with("timeout = 30\ntimeout = ${?TIMEOUT}", &[("TIMEOUT", "60")]).unwrap();
    assert_eq!(document.get_int("timeout").unwrap(), 60);
}

#[test]
fn test_absent_optional_removes_its_element() {
    let document = parse("x = [1, ${?FOO}, 2]").unwrap();
    assert_eq!(document.get_int_list("x").unwrap(), vec![1, 2]);

    let document = parse("a = foo ${?bar} baz").unwrap();
    assert_eq!(document.get_string("a").unwrap(), "foo  baz");

    let document = parse("[${?x}, 1]").unwrap();
    let items = document.root().as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items.iter().next().and_then(|v| v.as_literal()).map(|l| l.text()), Some("1"));

    let document = parse_with("x = [1, ${?FOO}, 2]", &[("FOO", "7")]).unwrap();
    assert_eq!(document.get_int_list("x").unwrap(), vec![1, 7, 2]);
}

#[test]
fn test_environment_fallback() {
    let document = parse_with("home = ${HOME_DIR}\nlogs = ${home}/logs", &[("HOME_DIR", "/srv")])
        .unwrap();
    assert_eq!(document.get_string("home").unwrap(), "/srv");
    assert_eq!(document.get_string("logs").unwrap(), "/srv/logs");

    // Document paths take precedence over variables
    let document = parse_with("FOO = local\nvalue = ${FOO}", &[("FOO", "env")]).unwrap();
    assert_eq!(document.get_string("value").unwrap(), "local");
}

#[test]
fn test_environment_fallback_can_be_disabled() {
    let mut handler = MapVariableHandler::new();
    handler.insert("FOO", "bar");
    let result = HoconParserBuilder::new("value = ${FOO}")
        .with_config(ParserConfig::new().with_environment_fallback(false))
        .with_variable_handler(Box::new(handler))
        .parse();
    assert!(matches!(
        result,
        Err(HoconError::Resolve(ResolveError::UnresolvedSubstitution { .. }))
    ));
}

#[test]
fn test_chained_variable_handlers() {
    let mut first = MapVariableHandler::new();
    first.insert("A", "from-first");
    let mut second = MapVariableHandler::new();
    second.insert("A", "from-second");
    second.insert("B", "only-second");

    let handler = ChainedVariableHandler::from_handlers(vec![Box::new(first), Box::new(second)]);
    let document = HoconParserBuilder::new("a = ${A}\nb = ${B}")
        .with_variable_handler(Box::new(handler))
        .parse()
        .unwrap();
    assert_eq!(document.get_string("a").unwrap(), "from-first");
    assert_eq!(document.get_string("b").unwrap(), "only-second");
}

#[test]
fn test_overridden_substitution_is_not_resolved() {
    // The first assignment is replaced before anything reads it
    let document = parse("a = ${does.not.exist}\na = 1").unwrap();
    assert_eq!(document.get_int("a").unwrap(), 1);
}

#[test]
fn test_cycles_are_detected() {
    match parse("a = ${b}\nb = ${c}\nc = ${a}") {
        Err(HoconError::Parse(ParseError::CyclicSubstitution { chain, .. })) => {
            assert!(chain.matches("->").count() >= 2, "chain was {}", chain);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }

    assert!(matches!(
        parse("a = ${a}"),
        Err(HoconError::Resolve(ResolveError::UnresolvedSubstitution { .. }))
    ));
}

#[test]
fn test_substitution_type_mismatch() {
    let result = parse("obj { x = 1 }\nbad = ${obj} text");
    assert!(matches!(
        result,
        Err(HoconError::Parse(ParseError::TypeMismatch { .. }))
    ));
}

#[test]
fn test_unresolved_reports_position() {
    match parse("a = 1\n\nb = ${nowhere}") {
        Err(HoconError::Resolve(ResolveError::UnresolvedSubstitution { path, position })) => {
            assert_eq!(path, "nowhere");
            assert_eq!(position.line, 3);
            assert_eq!(position.column, 5);
        }
        other => panic!("expected unresolved substitution, got {:?}", other),
    }
}

#[test]
fn test_included_substitutions_are_prefixed() {
    let resolver = |_: IncludeKind, name: &str| match name {
        "inner.conf" => Some("y = 1\nz = ${y}\nfrom_root = ${top}".to_string()),
        _ => None,
    };
    let document = HoconParserBuilder::new("top = 5\nouter { include \"inner.conf\" }\nouter.y = 2")
        .with_include_resolver(resolver)
        .with_variable_handler(Box::new(MapVariableHandler::new()))
        .parse()
        .unwrap();

    assert_eq!(document.get_int("outer.y").unwrap(), 2);
    assert_eq!(document.get_int("outer.z").unwrap(), 2);
    // Falls back to the path as written in the included document
    assert_eq!(document.get_int("outer.from_root").unwrap(), 5);
}
