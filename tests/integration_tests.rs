//! Integration tests with real-world HOCON configuration scenarios
//!
//! These tests drive the whole pipeline through the public API the way
//! an application loading its configuration would.

use hocon_parser::{HoconDocument, HoconValue, IncludeKind, from_str, parse, parse_with_includes};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize, PartialEq)]
struct Endpoint {
    host: String,
    port: u16,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ServiceConfig {
    name: String,
    endpoint: Endpoint,
    replicas: u32,
    tags: Vec<String>,
    labels: HashMap<String, String>,
    #[serde(default)]
    description: Option<String>,
}

#[test]
fn test_application_config_with_serde() {
    let text = r#"
        # Shared defaults
        defaults {
            endpoint { host = localhost, port = 8080 }
            replicas = 1
        }

        service = ${defaults} {
            name = billing
            endpoint.port = 9090
            replicas = 3
            tags = [payments, internal]
            labels { team = finance, tier = backend }
        }
    "#;

    #[derive(Debug, Deserialize)]
    struct Root {
        service: ServiceConfig,
    }

    let root: Root = from_str(text).unwrap();
    assert_eq!(
        root.service,
        ServiceConfig {
            name: "billing".to_string(),
            endpoint: Endpoint {
                host: "localhost".to_string(),
                port: 9090,
            },
            replicas: 3,
            tags: vec!["payments".to_string(), "internal".to_string()],
            labels: HashMap::from([
                ("team".to_string(), "finance".to_string()),
                ("tier".to_string(), "backend".to_string()),
            ]),
            description: None,
        }
    );
}

#[test]
fn test_json_document_is_valid_hocon() {
    let text = r#"{
        "name": "my-app",
        "port": 8080,
        "ratio": 0.75,
        "enabled": true,
        "owner": null,
        "features": ["auth", "logging"],
        "nested": { "inner": { "value": "x" } }
    }"#;

    let document = parse(text).unwrap();
    assert_eq!(document.get_string("name").unwrap(), "my-app");
    assert_eq!(document.get_int("port").unwrap(), 8080);
    assert_eq!(document.get_double("ratio").unwrap(), 0.75);
    assert!(document.get_boolean("enabled").unwrap());
    assert!(document.get_value("owner").unwrap().is_null());
    assert_eq!(
        document.get_string_list("features").unwrap(),
        vec!["auth", "logging"]
    );
    assert_eq!(document.get_string("nested.inner.value").unwrap(), "x");
}

#[test]
fn test_object_merge_across_assignments() {
    let document = parse("a { x = 1, y = 2 }\na { y = 3, z = 4 }").unwrap();
    assert_eq!(document.get_int("a.x").unwrap(), 1);
    assert_eq!(document.get_int("a.y").unwrap(), 3);
    assert_eq!(document.get_int("a.z").unwrap(), 4);
}

#[test]
fn test_non_object_breaks_merge() {
    let document = parse("a { x = 1 }\na = 5").unwrap();
    assert_eq!(document.get_int("a").unwrap(), 5);

    let document = parse("a { x = 1 }\na = 5\na { y = 2 }").unwrap();
    assert!(!document.has_path("a.x"));
    assert_eq!(document.get_int("a.y").unwrap(), 2);
}

#[test]
fn test_dotted_keys_build_nested_objects() {
    let document = parse("a.b.c = 1\na.b.d = 2\n\"a.b\" = quoted").unwrap();
    assert_eq!(document.get_int("a.b.c").unwrap(), 1);
    assert_eq!(document.get_int("a.b.d").unwrap(), 2);
    assert_eq!(document.get_string("\"a.b\"").unwrap(), "quoted");
    assert_eq!(document.get_object("a.b").unwrap().len(), 2);
}

#[test]
fn test_backslash_in_quoted_key() {
    let document = parse(r#""a\\b" = 1"#).unwrap();
    assert_eq!(document.get_int("\"a\\\\b\"").unwrap(), 1);
    assert_eq!(document.root().as_object().unwrap().keys().collect::<Vec<_>>(), vec!["a\\b"]);
    assert!(!document.has_path("a"));
}

#[test]
fn test_unquoted_and_concatenated_strings() {
    let text = r#"
        greeting = hello   world
        mixed = "quoted" unquoted
        path = /var/log/app
        url = "http://example.com"
        number_text = 1 2 3
    "#;
    let document = parse(text).unwrap();
    assert_eq!(document.get_string("greeting").unwrap(), "hello   world");
    assert_eq!(document.get_string("mixed").unwrap(), "quoted unquoted");
    assert_eq!(document.get_string("path").unwrap(), "/var/log/app");
    assert_eq!(document.get_string("url").unwrap(), "http://example.com");
    assert_eq!(document.get_string("number_text").unwrap(), "1 2 3");
}

#[test]
fn test_comments_and_separators() {
    // A key followed by a bare value has no separator
    assert!(parse("a = 1\nc 3").is_err());

    let document = parse("// comment\na = 1 # trailing\nb : 2,\nd { e = 4 },").unwrap();
    assert_eq!(document.get_int("a").unwrap(), 1);
    assert_eq!(document.get_int("b").unwrap(), 2);
    assert_eq!(document.get_int("d.e").unwrap(), 4);
}

#[test]
fn test_empty_and_array_documents() {
    let document = parse("").unwrap();
    assert_eq!(document.root().as_object().map(|o| o.len()), Some(0));

    let document = parse("# only a comment\n").unwrap();
    assert!(document.root().as_object().is_some());

    let document = parse("[{ name = a }, { name = b }]").unwrap();
    let items = document.root().as_array().unwrap();
    assert_eq!(items.len(), 2);
}

#[test]
fn test_with_fallback_layers_documents() {
    let application = parse("server { port = 9090 }\nmode = production").unwrap();
    let reference = parse("server { port = 80, host = localhost }\nmode = dev\nretries = 3").unwrap();

    let merged = application.with_fallback(&reference);
    assert_eq!(merged.get_int("server.port").unwrap(), 9090);
    assert_eq!(merged.get_string("server.host").unwrap(), "localhost");
    assert_eq!(merged.get_string("mode").unwrap(), "production");
    assert_eq!(merged.get_int("retries").unwrap(), 3);

    // Inputs are untouched
    assert!(!application.has_path("retries"));
}

#[test]
fn test_round_trip_through_hocon_text() {
    let text = r#"
        name = "service \"alpha\""
        port = 0x1F
        ratio = 1.5
        enabled = yes
        nothing = null
        list = [1, 2, 3]
        servers = [{ host = a }, { host = b }]
        "dotted.key" { inner = "line\nbreak" }
        empty {}
        none = []
    "#;
    let document = parse(text).unwrap();
    let rendered = document.to_hocon_string(2);
    let reparsed = parse(&rendered).unwrap();
    assert_eq!(reparsed, document);
    assert_eq!(reparsed.get_int("port").unwrap(), 31);
}

#[test]
fn test_typed_accessors() {
    let text = r#"
        hex = 0x1F
        octal = 017
        negative = -42
        big = 9000000000
        pi = 3.14159
        infinite_value = Infinity
        timeout = 500ms
        retry = 5 seconds
        bare_duration = 250
        forever = infinite
        buffer = 10MiB
        disk = 2 gigabytes
        flag_on = on
        flag_no = no
        small = 200
    "#;
    let document = parse(text).unwrap();

    assert_eq!(document.get_int("hex").unwrap(), 31);
    assert_eq!(document.get_int("octal").unwrap(), 15);
    assert_eq!(document.get_long("negative").unwrap(), -42);
    assert_eq!(document.get_long("big").unwrap(), 9_000_000_000);
    assert!(document.get_int("big").is_err());
    assert!((document.get_double("pi").unwrap() - 3.14159).abs() < f64::EPSILON);
    assert_eq!(document.get_decimal("pi").unwrap(), 3.14159);
    assert_eq!(document.get_double("infinite_value").unwrap(), f64::INFINITY);

    let timeout = document.get_time_span("timeout").unwrap();
    assert_eq!(timeout.as_duration(), Some(Duration::from_millis(500)));
    let retry = document.get_time_span("retry").unwrap();
    assert_eq!(retry.as_duration(), Some(Duration::from_secs(5)));
    let bare = document.get_time_span("bare_duration").unwrap();
    assert_eq!(bare.as_duration(), Some(Duration::from_millis(250)));
    assert!(document.get_time_span("forever").unwrap().is_infinite());

    assert_eq!(document.get_byte_size("buffer").unwrap(), 10 * 1024 * 1024);
    assert_eq!(document.get_byte_size("disk").unwrap(), 2_000_000_000);

    assert!(document.get_boolean("flag_on").unwrap());
    assert!(!document.get_boolean("flag_no").unwrap());

    assert_eq!(document.get_byte("small").unwrap(), 200);
    assert!(document.get_byte("negative").is_err());
}

#[test]
fn test_defaults_and_optional_getters() {
    let document = parse("port = 8080\nname = app").unwrap();

    assert_eq!(document.get_int_or("port", 1).unwrap(), 8080);
    assert_eq!(document.get_int_or("missing", 1).unwrap(), 1);
    assert!(document.get_int_or("name", 1).is_err());
    assert_eq!(document.try_get_int("name"), None);
    assert_eq!(document.try_get_string("name").as_deref(), Some("app"));
    assert_eq!(
        document.get_string_or("missing", "fallback".to_string()).unwrap(),
        "fallback"
    );
}

#[test]
fn test_lists_and_numeric_objects() {
    let text = r#"
        ints = [1, 2, 3]
        sizes = [1kB, 2KiB]
        spans = [1s, 2m]
        flags = [true, off]
        indexed { 2 = c, 0 = a, 1 = b }
        objects = [{ id = 1 }, { id = 2 }]
        sparse { 0 = a, one = b }
    "#;
    let document = parse(text).unwrap();

    assert_eq!(document.get_int_list("ints").unwrap(), vec![1, 2, 3]);
    assert_eq!(document.get_long_list("ints").unwrap(), vec![1, 2, 3]);
    assert_eq!(document.get_byte_size_list("sizes").unwrap(), vec![1000, 2048]);
    assert_eq!(
        document
            .get_time_span_list("spans")
            .unwrap()
            .iter()
            .map(|span| span.as_duration())
            .collect::<Vec<_>>(),
        vec![Some(Duration::from_secs(1)), Some(Duration::from_secs(120))]
    );
    assert_eq!(document.get_boolean_list("flags").unwrap(), vec![true, false]);
    assert_eq!(document.get_string_list("indexed").unwrap(), vec!["a", "b", "c"]);
    assert_eq!(document.get_array("indexed").unwrap().len(), 3);

    let objects = document.get_object_list("objects").unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(
        objects[1].get("id").and_then(HoconValue::as_literal).map(|l| l.text()),
        Some("2")
    );

    assert!(document.get_string_list("sparse").is_err());
    assert!(document.get_int_list("flags").is_err());
}

#[test]
fn test_included_configuration_tree() {
    let files: HashMap<&str, &str> = HashMap::from([
        ("database.conf", "url = \"postgres://db\"\npool { size = 10 }"),
        ("cache.conf", "ttl = 30s\ninclude \"limits.conf\""),
        ("limits.conf", "max_entries = 1000"),
    ]);

    let text = r#"
        database { include "database.conf" }
        cache { include file("cache.conf") }
        include "missing.conf"
        database.pool.size = 20
    "#;
    let document: HoconDocument = parse_with_includes(text, |kind: IncludeKind, name: &str| {
        assert_eq!(kind, IncludeKind::File);
        files.get(name).map(|text| text.to_string())
    })
    .unwrap();

    assert_eq!(document.get_string("database.url").unwrap(), "postgres://db");
    assert_eq!(document.get_int("database.pool.size").unwrap(), 20);
    assert_eq!(document.get_int("cache.max_entries").unwrap(), 1000);
    assert_eq!(
        document.get_time_span("cache.ttl").unwrap().as_duration(),
        Some(Duration::from_secs(30))
    );
}
