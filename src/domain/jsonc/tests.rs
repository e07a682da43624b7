use super::*;
use serde_json::json;

fn opts() -> FormattingOptions {
    FormattingOptions::default()
}

#[test]
fn parse_accepts_comments_and_trailing_commas() {
    let text = "\u{feff}{\n  // line\n  \"a\": 1, /* block */\n  \"b\": [true, null,],\n}\n";
    let value = parse(text).expect("parse");
    assert_eq!(value, json!({"a": 1, "b": [true, null]}));
}

#[test]
fn parse_blank_and_comment_only_is_null() {
    assert_eq!(parse("").expect("parse"), Value::Null);
    assert_eq!(parse("  // nothing here\n").expect("parse"), Value::Null);
}

#[test]
fn parse_rejects_garbage() {
    for text in ["{", "{\"a\" 1}", "{\"a\": tru}", "{\"a\": 1} x", "/* open"] {
        let err = parse(text).unwrap_err();
        assert!(err.is_parse(), "{text}: {err}");
    }
}

#[test]
fn insert_keeps_comments_and_removal_restores_bytes() {
    let original = "{\n  // keep me\n  \"foo\": 1\n}";
    let added = set_path(original, &["chatgpt.apiBase"], Some(&json!("https://x")), &opts())
        .expect("insert");
    assert_eq!(
        added,
        "{\n  // keep me\n  \"foo\": 1,\n  \"chatgpt.apiBase\": \"https://x\"\n}"
    );

    let removed = set_path(&added, &["chatgpt.apiBase"], None, &opts()).expect("delete");
    assert_eq!(removed, original);
}

#[test]
fn replace_existing_value_touches_only_that_value() {
    let text = "{\n  \"a\": \"old\", // note\n  \"b\": 2\n}";
    let out = set_path(text, &["a"], Some(&json!("new")), &opts()).expect("replace");
    assert_eq!(out, "{\n  \"a\": \"new\", // note\n  \"b\": 2\n}");
}

#[test]
fn insert_creates_missing_parent_objects() {
    let text = "{\n  \"foo\": 1\n}";
    let out = set_path(
        text,
        &["chatgpt.config", "preferred_auth_method"],
        Some(&json!("apikey")),
        &opts(),
    )
    .expect("insert");
    assert_eq!(
        out,
        "{\n  \"foo\": 1,\n  \"chatgpt.config\": {\n    \"preferred_auth_method\": \"apikey\"\n  }\n}"
    );
    assert_eq!(
        parse(&out).expect("parse")["chatgpt.config"]["preferred_auth_method"],
        "apikey"
    );
}

#[test]
fn insert_into_empty_object_indents_child() {
    let out = set_path("{}", &["a"], Some(&json!(1)), &opts()).expect("insert");
    assert_eq!(out, "{\n  \"a\": 1\n}");

    let nested = "{\n  \"x\": {}\n}";
    let out = set_path(nested, &["x", "y"], Some(&json!(true)), &opts()).expect("insert");
    assert_eq!(out, "{\n  \"x\": {\n    \"y\": true\n  }\n}");
}

#[test]
fn insert_on_single_line_object_stays_inline() {
    let out = set_path("{\"a\": 1}", &["b"], Some(&json!("x")), &opts()).expect("insert");
    assert_eq!(out, "{\"a\": 1, \"b\": \"x\"}");
}

#[test]
fn delete_first_and_only_property() {
    let text = "{\n  \"a\": 1,\n  \"b\": 2\n}";
    let out = set_path(text, &["a"], None, &opts()).expect("delete");
    assert_eq!(out, "{\n  \"b\": 2\n}");

    let out = set_path(&out, &["b"], None, &opts()).expect("delete");
    assert_eq!(out, "{}");
}

#[test]
fn delete_lone_commented_property_drops_its_comma() {
    let text = "{\n  // my settings\n  \"chatgpt.apiBase\": \"https://old\",\n}\n";
    let out = set_path(text, &["chatgpt.apiBase"], None, &opts()).expect("delete");
    assert_eq!(out, "{\n  // my settings\n  \n}\n");
    assert_eq!(parse(&out).expect("parse"), json!({}));

    let nested = "{\n  \"chatgpt.config\": { // why\n    \"preferred_auth_method\": \"apikey\",\n  }\n}";
    let out = set_path(nested, &["chatgpt.config", "preferred_auth_method"], None, &opts())
        .expect("delete");
    assert!(out.contains("// why"), "{out}");
    assert_eq!(parse(&out).expect("parse"), json!({"chatgpt.config": {}}));
}

#[test]
fn delete_missing_path_is_noop() {
    let text = "{\n  \"a\": 1\n}";
    assert!(modify(text, &["zzz"], None, &opts()).expect("modify").is_empty());
    assert!(modify(text, &["x", "y"], None, &opts()).expect("modify").is_empty());
    assert!(modify("", &["a"], None, &opts()).expect("modify").is_empty());
}

#[test]
fn setting_under_scalar_parent_is_shape_error() {
    let err = modify("{\"a\": 1}", &["a", "b"], Some(&json!(1)), &opts()).unwrap_err();
    assert!(err.to_string().starts_with("CONFIG_SHAPE_ERROR"), "{err}");
}

#[test]
fn empty_document_gets_fresh_object() {
    let out = set_path("", &["a", "b"], Some(&json!(1)), &opts()).expect("insert");
    assert_eq!(out, "{\n  \"a\": {\n    \"b\": 1\n  }\n}");
}

#[test]
fn duplicate_keys_resolve_to_first_for_edits() {
    let text = "{\"a\": 1, \"a\": 2}";
    let out = set_path(text, &["a"], Some(&json!(9)), &opts()).expect("replace");
    assert_eq!(out, "{\"a\": 9, \"a\": 2}");
}

#[test]
fn tab_indentation_is_honored() {
    let options = FormattingOptions {
        insert_spaces: false,
        tab_size: 4,
        eol: "\n".to_string(),
    };
    let out = set_path("{\n\t\"a\": 1\n}", &["b"], Some(&json!({"c": 1})), &options)
        .expect("insert");
    assert_eq!(out, "{\n\t\"a\": 1,\n\t\"b\": {\n\t\t\"c\": 1\n\t}\n}");
}

#[test]
fn apply_edits_skips_out_of_range() {
    let edits = vec![
        Edit {
            offset: 100,
            length: 1,
            content: "x".to_string(),
        },
        Edit {
            offset: 0,
            length: 1,
            content: "[".to_string(),
        },
    ];
    assert_eq!(apply_edits("{}", &edits), "[}");
}
