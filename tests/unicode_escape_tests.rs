//! String forms and escape handling
//!
//! Quoted strings use JSON escapes, including surrogate pairs; triple
//! quoted strings are raw; unquoted text passes UTF-8 through untouched.

use hocon_parser::{HoconError, LexError, from_str, parse};
use pretty_assertions::assert_eq;
use serde_json::Value;

#[test]
fn test_json_escapes() {
    let config = r#"
        quote = "say \"hi\""
        backslash = "C:\\temp"
        slash = "a\/b"
        controls = "tab\there\nnewline\rreturn\bback\fform"
    "#;

    let result: Value = from_str(config).expect("Should parse JSON escapes");
    assert_eq!(result["quote"], "say \"hi\"");
    assert_eq!(result["backslash"], "C:\\temp");
    assert_eq!(result["slash"], "a/b");
    assert_eq!(
        result["controls"],
        "tab\there\nnewline\rreturn\u{8}back\u{c}form"
    );
}

#[test]
fn test_unicode_escapes() {
    let config = r#"
        latin = "\u0041\u00e9"
        chinese = "\u4E2D\u6587"
        infinity_sign = "\u221E"
        grinning_face = "\uD83D\uDE00"
    "#;

    let result: Value = from_str(config).expect("Should parse unicode escapes");
    assert_eq!(result["latin"], "Aé");
    assert_eq!(result["chinese"], "中文");
    assert_eq!(result["infinity_sign"], "∞");
    assert_eq!(result["grinning_face"], "😀");
}

#[test]
fn test_raw_utf8_everywhere() {
    let config = r#"
        unquoted = héllo wörld
        quoted = "русский"
        ключ = значение
        "日本" { 語 = テスト }
    "#;

    let document = parse(config).expect("Should parse raw UTF-8");
    assert_eq!(document.get_string("unquoted").unwrap(), "héllo wörld");
    assert_eq!(document.get_string("quoted").unwrap(), "русский");
    assert_eq!(document.get_string("ключ").unwrap(), "значение");
    assert_eq!(document.get_string("日本.語").unwrap(), "テスト");
}

#[test]
fn test_single_quoted_strings() {
    let config = r#"
        single = 'it said "hello"'
        escaped = 'line\nbreak'
    "#;

    let result: Value = from_str(config).expect("Should parse single-quoted strings");
    assert_eq!(result["single"], "it said \"hello\"");
    assert_eq!(result["escaped"], "line\nbreak");
}

#[test]
fn test_triple_quoted_strings_are_raw() {
    let config = "raw = \"\"\"C:\\temp\\new \"x\" \"\"\"\nmulti = \"\"\"first\n  second\"\"\"";

    let document = parse(config).expect("Should parse triple-quoted strings");
    assert_eq!(document.get_string("raw").unwrap(), "C:\\temp\\new \"x\" ");
    assert_eq!(document.get_string("multi").unwrap(), "first\n  second");
}

#[test]
fn test_quoted_strings_stay_strings() {
    let document = parse("a = \"42\"\nb = \"true\"\nc = \"null\"").unwrap();
    let result: Value = from_str("a = \"42\"\nb = \"true\"\nc = \"null\"").unwrap();
    assert_eq!(result["a"], "42");
    assert_eq!(result["b"], "true");
    assert_eq!(result["c"], "null");
    // Typed accessors still convert on request
    assert_eq!(document.get_int("a").unwrap(), 42);
    assert!(document.get_boolean("b").unwrap());
}

#[test]
fn test_invalid_escapes() {
    let cases = [
        r#"a = "\x41""#,
        r#"a = "\u12""#,
        r#"a = "\uZZZZ""#,
        r#"a = "\uDE00""#,
        r#"a = "\uD83D alone""#,
    ];

    for config in cases {
        match parse(config) {
            Err(HoconError::Lex(
                LexError::InvalidEscape { .. } | LexError::InvalidUnicodeEscape { .. },
            )) => {}
            other => panic!("Expected escape error for {}, got: {:?}", config, other),
        }
    }
}

#[test]
fn test_newline_inside_quoted_string_is_rejected() {
    assert!(matches!(
        parse("a = \"first\nsecond\""),
        Err(HoconError::Lex(LexError::UnterminatedString { .. }))
    ));
}
