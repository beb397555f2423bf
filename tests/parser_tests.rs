use djson::{parse_djs, parse_json, CommentType, JsonArray, JsonObject, JsonValue};

fn parse(text: &str) -> JsonValue {
    parse_djs(text).expect("document failed to parse")
}

#[test]
fn parse_ignores_trailing_commas() {
    let expected: JsonValue = JsonArray::new().with(1).with(2).with(3).into();
    assert!(expected.matches(&parse("[1,2,3,]")));
}

#[test]
fn parse_reads_unquoted_keys() {
    let value = parse("{key:'value'}");
    assert_eq!(Some("key"), value.as_object().unwrap().keys().next());
}

#[test]
fn parse_reads_multiple_unquoted_keys() {
    let expected: JsonValue = JsonObject::new().with("k1", "v1").with("k2", "v2").into();
    assert!(expected.matches(&parse("{k1:'v1',k2:'v2'}")));
}

#[test]
fn parse_reads_open_root() {
    let expected: JsonValue = JsonObject::new().with("a", 1).with("b", 2).into();
    assert!(expected.matches(&parse("a:1,b:2")));
}

#[test]
fn parse_reads_numeric_keys() {
    let value = parse("1.5: 'x'");
    assert_eq!(Some("1.5"), value.as_object().unwrap().keys().next());
}

#[test]
fn open_root_first_member_at_top_is_auto() {
    let value = parse("a:1");
    assert_eq!(-1, value.as_object().unwrap().get("a").unwrap().lines_above());
}

#[test]
fn parse_does_not_tolerate_non_delimited_containers() {
    assert!(parse_djs("[[][]]").is_err());
}

#[test]
fn parse_does_not_tolerate_leading_delimiter() {
    let err = parse_djs("[,]").unwrap_err();
    assert!(err.to_string().contains("leading delimiter"), "{}", err);
}

#[test]
fn parse_does_not_tolerate_missing_value() {
    assert!(parse_djs("k:,").is_err());
}

#[test]
fn parse_does_not_tolerate_missing_key() {
    assert!(parse_djs(":").is_err());
}

#[test]
fn empty_file_is_implicitly_an_object() {
    assert!(parse("").is_object());
}

#[test]
fn members_may_be_separated_by_newlines() {
    let expected: JsonValue = JsonObject::new().with("k", "v").with("r", "t").into();
    assert!(expected.matches(&parse("k:'v'\nr:'t'")));
}

#[test]
fn parse_does_not_tolerate_newlines_in_key() {
    let err = parse_djs("k\n1:v").unwrap_err();
    assert!(err.to_string().contains("whitespace in key"), "{}", err);
}

#[test]
fn parse_does_not_tolerate_whitespace_in_key() {
    let err = parse_djs("{a b: 1}").unwrap_err();
    assert!(err.to_string().contains("whitespace in key"), "{}", err);
}

#[test]
fn parse_reports_punctuation_in_key() {
    let err = parse_djs("{<: 1}").unwrap_err();
    assert!(err.to_string().contains("punctuation ('<') in key"), "{}", err);
}

#[test]
fn parse_reads_empty_single_quoted_string() {
    assert_eq!(Some(""), parse("''").as_str());
}

#[test]
fn parse_reads_multiline_string() {
    assert_eq!(Some("test"), parse("'''test'''").as_str());
}

#[test]
fn parse_tolerates_empty_multiline_string() {
    assert_eq!(Some(""), parse("''''''").as_str());
}

#[test]
fn multiline_string_ignores_leading_whitespace() {
    assert_eq!(Some("test"), parse("'''  test'''").as_str());
}

#[test]
fn multiline_string_ignores_trailing_newline() {
    assert_eq!(Some("test"), parse("'''test\n'''").as_str());
}

#[test]
fn multiline_string_preserves_indentation_of_subsequent_lines() {
    let text = "multi:\n  '''\n  0\n   1\n    2\n  '''\n";
    let value = parse(text);
    assert_eq!(Some("0\n 1\n  2"), value.as_object().unwrap().get("multi").unwrap().as_str());
}

#[test]
fn parse_reads_leading_decimal() {
    assert_eq!(Some(0.1234), parse(".1234").as_f64());
}

#[test]
fn parse_does_not_tolerate_leading_decimal_without_number() {
    assert!(parse_djs(".+1234").is_err());
}

#[test]
fn parse_ignores_leading_plus() {
    assert_eq!(Some(1234.0), parse("+1234").as_f64());
}

#[test]
fn parse_does_not_tolerate_leading_plus_without_number() {
    assert!(parse_djs("+.1234").is_err());
}

#[test]
fn parse_reads_infinity_literals() {
    assert_eq!(Some(f64::INFINITY), parse("infinity").as_f64());
    assert_eq!(Some(f64::NEG_INFINITY), parse("-infinity").as_f64());
    let value = parse("a: -infinity");
    assert_eq!(Some(f64::NEG_INFINITY), value.as_object().unwrap().get("a").unwrap().as_f64());
}

#[test]
fn parse_rejects_unknown_words() {
    let err = parse_djs("bananas").unwrap_err();
    assert!(err.to_string().contains("Illegal token 'bananas'"), "{}", err);
}

// comment attachment

#[test]
fn parse_preserves_header_comment_at_top_of_file() {
    for comment in ["/*header*/", "#header", "//header"] {
        let value = parse(&format!("{}\n{{}}", comment));
        assert_eq!("header", value.comment_text(CommentType::Header), "{}", comment);
    }
}

#[test]
fn parse_preserves_footer_comment_at_bottom_of_file() {
    for comment in ["/*footer*/", "#footer", "//footer"] {
        let value = parse(&format!("{{}}\n{}", comment));
        assert_eq!("footer", value.comment_text(CommentType::Footer), "{}", comment);
    }
}

#[test]
fn parse_preserves_eol_comment_after_closing_root_brace() {
    for comment in ["/*eol*/", "#eol", "//eol"] {
        let value = parse(&format!("{{}}{}", comment));
        assert_eq!("eol", value.comment_text(CommentType::Eol), "{}", comment);
    }
}

#[test]
fn parse_preserves_header_above_value() {
    for comment in ["/*header*/", "#header", "//header"] {
        let value = parse(&format!("{}\nk:'v'", comment));
        let member = value.as_object().unwrap().get_index(0).unwrap();
        assert_eq!("header", member.comment_text(CommentType::Header), "{}", comment);
    }
}

#[test]
fn parse_preserves_value_comment_between_key_and_value() {
    for comment in ["/*value*/", "#value", "//value"] {
        let value = parse(&format!("k:\n{}\n'v'", comment));
        let member = value.as_object().unwrap().get_index(0).unwrap();
        assert_eq!("value", member.comment_text(CommentType::Value), "{}", comment);
    }
}

#[test]
fn parse_preserves_eol_comment_after_value() {
    for comment in ["/*eol*/", "#eol", "//eol"] {
        let value = parse(&format!("k:'v'{}", comment));
        let member = value.as_object().unwrap().get_index(0).unwrap();
        assert_eq!("eol", member.comment_text(CommentType::Eol), "{}", comment);
    }
}

#[test]
fn parse_preserves_interior_comment_in_empty_container() {
    for comment in ["/*interior*/", "#interior", "//interior"] {
        let value = parse(&format!("{{\n{}\n}}", comment));
        assert_eq!("interior", value.comment_text(CommentType::Interior), "{}", comment);
    }
}

#[test]
fn parse_preserves_blank_lines_after_comments() {
    let value = parse("k1:'v1'\n//comment\n\nk:'v'");
    let member = value.as_object().unwrap().get_index(1).unwrap();
    assert_eq!("comment\n", member.comment_text(CommentType::Header));
    assert_eq!(1, member.lines_above());
}

#[test]
fn single_blank_gap_keeps_comments_in_the_file_header() {
    let value = parse("// top\n\n# header\nkey: 'value'");
    assert_eq!("top\n\nheader", value.comment_text(CommentType::Header));
    let member = value.as_object().unwrap().get_index(0).unwrap();
    assert_eq!("", member.comment_text(CommentType::Header));
}

#[test]
fn double_blank_gap_separates_header_from_member_comments() {
    let text = "// part 1\n// part 2\n\n// part 3\n\n\n// mine\nkey: 'value'";
    let value = parse(text);
    assert_eq!("part 1\npart 2\n\npart 3", value.comment_text(CommentType::Header));
    let member = value.as_object().unwrap().get_index(0).unwrap();
    assert_eq!("mine", member.comment_text(CommentType::Header));
    assert_eq!(2, member.lines_above());
}

#[test]
fn footer_comments_attach_to_the_open_root() {
    let value = parse("a: 1\n// bye");
    assert_eq!("bye", value.comment_text(CommentType::Footer));
    assert_eq!(1, value.lines_trailing());
}

// strict JSON

#[test]
fn json_trailing_comma_is_fatal() {
    let err = parse_json("[1,2,3,]").unwrap_err();
    assert_eq!(Some(1), err.line());
    assert_eq!(Some(7), err.column());
}

#[test]
fn json_rejects_single_quotes() {
    assert!(parse_json("'x'").is_err());
}

#[test]
fn json_rejects_unquoted_keys() {
    assert!(parse_json("{a: 1}").is_err());
}

#[test]
fn json_rejects_comments() {
    assert!(parse_json("{} // done").is_err());
}

#[test]
fn json_rejects_infinity() {
    assert!(parse_json("infinity").is_err());
    assert!(parse_json("-infinity").is_err());
}

#[test]
fn json_accepts_the_full_grammar() {
    let text = r#"{"a": [1, -2.5, 1e3], "b": {"c": null, "d": [true, false]}, "e": "\u0041\n"}"#;
    let value = parse_json(text).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(Some("A\n"), object.get("e").unwrap().as_str());
    assert_eq!(
        Some(1000.0),
        object.get("a").unwrap().as_array().unwrap().get(2).unwrap().as_f64()
    );
}

#[test]
fn json_errors_carry_positions() {
    let err = parse_json("{\n  \"a\": x\n}").unwrap_err();
    assert_eq!(Some(2), err.line());
}

#[test]
fn djs_and_json_agree_on_common_documents() {
    let text = "{\"a\": [1, 2], \"b\": \"x\"}";
    let from_json = parse_json(text).unwrap();
    let from_djs = parse_djs(text).unwrap();
    assert!(from_json.matches(&from_djs));
}
