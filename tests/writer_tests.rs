use djson::{
    parse_djs, parse_json, stringify, JsonArray, JsonFormat, JsonObject, JsonValue, WriterOptions,
};

fn djs(text: &str) -> String {
    let value = parse_djs(text).expect("document failed to parse");
    stringify(&value, JsonFormat::DjsFormatted, &WriterOptions::default()).expect("write failed")
}

fn json_pretty(text: &str) -> String {
    let value = parse_djs(text).expect("document failed to parse");
    stringify(&value, JsonFormat::JsonFormatted, &WriterOptions::default()).expect("write failed")
}

#[test]
fn open_root_survives_preserving_rewrite() {
    assert_eq!("a: 1\nb: 2\n", djs("a: 1\nb: 2\n"));
}

#[test]
fn open_root_converts_to_default_json() {
    assert_eq!("{\n  \"a\": 1,\n  \"b\": 2\n}", json_pretty("a: 1\nb: 2\n"));
}

#[test]
fn compact_json_drops_all_whitespace() {
    let value = parse_djs("a: 1\nb: [1, 2]\n").unwrap();
    let text = stringify(&value, JsonFormat::Json, &WriterOptions::default()).unwrap();
    assert_eq!(r#"{"a":1,"b":[1,2]}"#, text);
}

#[test]
fn compact_djs_uses_comma_delimiters() {
    let value = parse_djs("a: 1\nb: 'two'\n").unwrap();
    let text = stringify(&value, JsonFormat::Djs, &WriterOptions::default()).unwrap();
    assert_eq!("a:1,b:'two'", text);
}

#[test]
fn condensed_members_stay_on_one_line() {
    assert_eq!("k3: 'v3', k4: 'v4'", djs("k3: 'v3', k4: 'v4'"));
}

#[test]
fn blank_lines_survive_conversion_to_json() {
    let input = "\nkey:\n  'value'\n\nanother:\n\n  # comment\n  'value'\n\nk3: 'v3', k4: 'v4'\n\n\n# and\nfinally: 'value'\n";
    let expected = "{\n  \"key\":\n    \"value\",\n\n  \"another\":\n\n    \"value\",\n\n  \"k3\": \"v3\", \"k4\": \"v4\",\n\n\n  \"finally\": \"value\"\n}";
    assert_eq!(expected, json_pretty(input));
}

#[test]
fn formatted_documents_rewrite_byte_identically() {
    let documents = [
        "a: 1\nb: 2\n",
        "key:\n  'value'\n\nanother:\n\n  # comment\n  'value'\n",
        "// top\n\n# header\nkey: 'value'",
        "a: 1 // first\nb: 2",
        "list: [\n  1\n  2\n  3\n]\n",
        "nested: {\n  inner: 'v'\n}\n",
    ];
    for document in documents {
        assert_eq!(document, djs(document), "\ndocument:\n{}", document);
    }
}

#[test]
fn format_preserving_round_trip_reaches_a_fixed_point() {
    let documents = [
        "a: 1\n// bye",
        "{\n  # interior\n}",
        "k:\n  /* why */\n  'v'\n",
        "a: [1, 2, 3]\nb: '''\n  m\n   n\n'''\n",
        "# one\n\n# two\n\n\n# mine\nkey: 'value'\n",
    ];
    for document in documents {
        let first = parse_djs(document).unwrap();
        let written = stringify(&first, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
        let second = parse_djs(&written).unwrap();
        assert_eq!(first, second, "\ndocument:\n{}\nrewritten:\n{}", document, written);
        let rewritten =
            stringify(&second, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
        assert_eq!(written, rewritten, "\ndocument:\n{}", document);
    }
}

#[test]
fn strict_json_round_trip_preserves_structure() {
    let value: JsonValue = JsonObject::new()
        .with("name", "unit")
        .with("values", JsonArray::new().with(1).with(2.5).with(JsonValue::null()))
        .with("ok", true)
        .into();
    let text = stringify(&value, JsonFormat::Json, &WriterOptions::default()).unwrap();
    let parsed = parse_json(&text).unwrap();
    assert!(parsed.matches(&value));
}

#[test]
fn multiline_strings_round_trip_under_indentation() {
    let value = parse_djs("text: '''\n  line one\n    line two\n  '''\n").unwrap();
    let written = stringify(&value, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
    let reparsed = parse_djs(&written).unwrap();
    assert_eq!(
        Some("line one\n  line two"),
        reparsed.as_object().unwrap().get("text").unwrap().as_str()
    );
}

#[test]
fn string_styles_are_preserved() {
    assert_eq!("a: 'single'\nb: \"double\"\n", djs("a: 'single'\nb: \"double\"\n"));
}

#[test]
fn comments_are_dropped_from_json_output() {
    let text = json_pretty("// top\na: 1 // eol\n# footer");
    assert!(!text.contains("top"));
    assert!(!text.contains("eol"));
    assert!(!text.contains("footer"));
}

#[test]
fn max_spacing_caps_preserved_blank_lines() {
    let input = "a: 1\n\n\n\n\n\n\n\n\nb: 2\n";
    let mut options = WriterOptions::default();
    options.max_spacing = 3;
    let value = parse_djs(input).unwrap();
    let text = stringify(&value, JsonFormat::DjsFormatted, &options).unwrap();
    assert_eq!("a: 1\n\n\nb: 2\n", text);
}

#[test]
fn allow_condense_false_breaks_condensed_siblings() {
    let mut options = WriterOptions::default();
    options.allow_condense = false;
    let value = parse_djs("a: 1, b: 2").unwrap();
    let text = stringify(&value, JsonFormat::DjsFormatted, &options).unwrap();
    assert_eq!("a: 1\nb: 2", text);
}

#[test]
fn root_braces_can_be_kept() {
    let mut options = WriterOptions::default();
    options.omit_root_braces = false;
    let value = parse_djs("a: 1\n").unwrap();
    let text = stringify(&value, JsonFormat::DjsFormatted, &options).unwrap();
    assert_eq!("{\n  a: 1\n}", text);
}

#[test]
fn quoted_keys_can_be_forced() {
    let mut options = WriterOptions::default();
    options.omit_quotes = false;
    let value = parse_djs("a: 1\n").unwrap();
    let text = stringify(&value, JsonFormat::DjsFormatted, &options).unwrap();
    assert_eq!("'a': 1\n", text);
}

#[test]
fn empty_containers_stay_condensed() {
    let value = parse_djs("a: {}\nb: []\n").unwrap();
    let text = stringify(&value, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
    assert_eq!("a: {}\nb: []\n", text);
}

#[test]
fn programmatic_values_format_with_defaults() {
    let value: JsonValue = JsonObject::new().with("a", 1).with("b", 2).into();
    let text = stringify(&value, JsonFormat::JsonFormatted, &WriterOptions::default()).unwrap();
    assert_eq!("{\n  \"a\": 1,\n  \"b\": 2\n}", text);
}

#[test]
fn keys_requiring_quotes_are_quoted() {
    let value: JsonValue = JsonObject::new().with("no spaces", 1).into();
    let text = stringify(&value, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
    assert_eq!("'no spaces': 1", text);
}

#[test]
fn eol_comes_before_the_next_member() {
    let input = "a: 1 // first\n\nb: 2 # second\n";
    let value = parse_djs(input).unwrap();
    let text = stringify(&value, JsonFormat::DjsFormatted, &WriterOptions::default()).unwrap();
    assert_eq!(input, text);
}
