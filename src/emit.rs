//! Block-style rendering of a [`Value`] tree.
//!
//! The layout matches what PyYAML produces with `default_flow_style=False`:
//!
//! ```text
//! server:
//!   host: 0.0.0.0
//!   ports:
//!   - 80
//!   - 443
//! debug: true
//! ```
//!
//! Sequence items sit at the indentation of the key that owns them, mappings
//! nested under a key are indented by two spaces, and a collection that is the
//! item of a sequence starts on the same line as its `- ` marker. Empty
//! collections have no block form and are written `{}` / `[]`.

use crate::value::{Mapping, Value};

const INDENT: usize = 2;

/// Longest key a reader accepts in `key: value` form. Longer keys use the
/// explicit `? key` form.
const MAX_IMPLICIT_KEY: usize = 1000;

pub fn render(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Mapping(map) if !map.is_empty() => write_mapping(&mut out, map, 0, false),
        Value::Sequence(items) if !items.is_empty() => write_sequence(&mut out, items, 0, false),
        scalar => {
            out.push_str(&scalar_text(scalar));
            out.push('\n');
        }
    }
    out
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

/// `inline_first` is set when the caller already wrote the indentation (and a
/// `- ` marker) for the first entry.
fn write_mapping(out: &mut String, map: &Mapping, indent: usize, inline_first: bool) {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 || !inline_first {
            pad(out, indent);
        }
        let key = quote(key);
        if key.chars().count() > MAX_IMPLICIT_KEY {
            out.push_str("? ");
            out.push_str(&key);
            out.push('\n');
            pad(out, indent);
        } else {
            out.push_str(&key);
        }
        out.push(':');
        match value {
            Value::Mapping(inner) if !inner.is_empty() => {
                out.push('\n');
                write_mapping(out, inner, indent + INDENT, false);
            }
            Value::Sequence(items) if !items.is_empty() => {
                out.push('\n');
                write_sequence(out, items, indent, false);
            }
            scalar => {
                out.push(' ');
                out.push_str(&scalar_text(scalar));
                out.push('\n');
            }
        }
    }
}

fn write_sequence(out: &mut String, items: &[Value], indent: usize, inline_first: bool) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 || !inline_first {
            pad(out, indent);
        }
        out.push_str("- ");
        match item {
            Value::Mapping(inner) if !inner.is_empty() => {
                write_mapping(out, inner, indent + INDENT, true);
            }
            Value::Sequence(inner) if !inner.is_empty() => {
                write_sequence(out, inner, indent + INDENT, true);
            }
            scalar => {
                out.push_str(&scalar_text(scalar));
                out.push('\n');
            }
        }
    }
}

/// Text of a scalar, or of an empty collection.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(true) => "true".to_owned(),
        Value::Bool(false) => "false".to_owned(),
        Value::Int(i) => itoa::Buffer::new().format(*i).to_owned(),
        Value::UInt(u) => itoa::Buffer::new().format(*u).to_owned(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => quote(s),
        Value::Sequence(_) => "[]".to_owned(),
        Value::Mapping(_) => "{}".to_owned(),
    }
}

/// Shortest text that reads back as the same `f64`, always recognisable as a
/// float (`1.0`, never `1`).
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_owned()
    } else if f.is_infinite() {
        let text = if f > 0.0 { ".inf" } else { "-.inf" };
        text.to_owned()
    } else {
        // Debug keeps the `.0` that Display drops
        format!("{:?}", f)
    }
}

/// Words that YAML 1.1 readers turn into booleans.
const LEGACY_BOOLS: &[&str] = &["y", "n", "yes", "no", "on", "off"];

/// YAML's printable set, without the tab and line breaks it also allows.
fn is_printable(c: char) -> bool {
    matches!(c,
        '\u{20}'..='\u{7e}'
        | '\u{a0}'..='\u{d7ff}'
        | '\u{e000}'..='\u{fffd}'
        | '\u{10000}'..='\u{10ffff}')
}

fn needs_double_quotes(c: char) -> bool {
    !is_printable(c) || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
}

/// Type a reader gives an unquoted scalar. Covers both YAML 1.1 and 1.2
/// readers, so the writer can quote anything that would not come back as a
/// string.
fn resolve_plain(s: &str) -> Value {
    match s {
        "null" | "Null" | "NULL" | "~" => Value::Null,
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        "{}" => Value::Mapping(Mapping::new()),
        "[]" => Value::Sequence(Vec::new()),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Value::Float(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Value::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Value::Float(f64::NAN),
        _ => parse_number(s).unwrap_or_else(|| Value::String(s.to_owned())),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if unsigned.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Some(Value::Int(i));
        }
        if let Ok(u) = s.parse::<u64>() {
            return Some(Value::UInt(u));
        }
    } else if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    s.parse::<f64>().ok().map(Value::Float)
}

/// Sexagesimal numbers, dates, `1_000` and radix prefixes (`0x1F`, `+0o17`).
fn looks_like_legacy_number(s: &str) -> bool {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let lower = unsigned.to_ascii_lowercase();
    unsigned.starts_with(|c: char| c.is_ascii_digit())
        && (unsigned.contains([':', '-', '_', ' '])
            || lower.starts_with("0x")
            || lower.starts_with("0o")
            || lower.starts_with("0b"))
}

fn must_quote(s: &str) -> bool {
    if s.is_empty() || s != s.trim() {
        return true;
    }
    if !matches!(resolve_plain(s), Value::String(_)) {
        return true;
    }
    if LEGACY_BOOLS.contains(&s.to_ascii_lowercase().as_str()) || looks_like_legacy_number(s) {
        return true;
    }
    if s.starts_with([
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ]) {
        return true;
    }
    s.starts_with("...")
        || s.contains(": ")
        || s.contains(" #")
        || s.ends_with(':')
}

/// Writes `s` plain when a reader would get the same string back, otherwise
/// single- or double-quoted.
pub(crate) fn quote(s: &str) -> String {
    if s.chars().any(needs_double_quotes) {
        return double_quoted(s);
    }
    if must_quote(s) {
        return format!("'{}'", s.replace('\'', "''"));
    }
    s.to_owned()
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if needs_double_quotes(c) => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02X}", code));
                } else {
                    out.push_str(&format!("\\u{:04X}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn json(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn server_scenario() {
        let doc = json(r#"{"server": {"host": "0.0.0.0", "port": 80}, "debug": true}"#);
        assert_eq!(
            render(&doc),
            "server:\n  host: 0.0.0.0\n  port: 80\ndebug: true\n"
        );
    }

    #[test]
    fn sequences() {
        let doc = json(
            r#"{"hardware": [{"type": "NIDAQ", "channels": {}}, {"type": "ADAM", "tags": ["a", "b"]}],
                "matrix": [[1, 2], [], [3]]}"#,
        );
        let expected = "\
hardware:
- type: NIDAQ
  channels: {}
- type: ADAM
  tags:
  - a
  - b
matrix:
- - 1
  - 2
- []
- - 3
";
        assert_eq!(render(&doc), expected);
    }

    #[test]
    fn scalars() {
        let doc = json(
            r#"{"n": null, "f": 1.0, "g": 0.25, "big": 1e300, "neg": -3, "empty": [], "s": ""}"#,
        );
        assert_eq!(
            render(&doc),
            "n: null\nf: 1.0\ng: 0.25\nbig: 1e300\nneg: -3\nempty: []\ns: ''\n"
        );
        assert_eq!(format_float(f64::INFINITY), ".inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-.inf");
        assert_eq!(format_float(f64::NAN), ".nan");
    }

    #[test]
    fn empty_document() {
        assert_eq!(render(&Value::Mapping(Mapping::new())), "{}\n");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("plain text"), "plain text");
        assert_eq!(quote("0.0.0.0"), "0.0.0.0");
        assert_eq!(quote("/var/log/app.log"), "/var/log/app.log");
        assert_eq!(quote("true"), "'true'");
        assert_eq!(quote("yes"), "'yes'");
        assert_eq!(quote("null"), "'null'");
        assert_eq!(quote("~"), "'~'");
        assert_eq!(quote("80"), "'80'");
        assert_eq!(quote("1e5"), "'1e5'");
        assert_eq!(quote(".inf"), "'.inf'");
        assert_eq!(quote("2024-01-31"), "'2024-01-31'");
        assert_eq!(quote("12:30"), "'12:30'");
        assert_eq!(quote("0x1F"), "'0x1F'");
        assert_eq!(quote("- item"), "'- item'");
        assert_eq!(quote("key: value"), "'key: value'");
        assert_eq!(quote("a #comment"), "'a #comment'");
        assert_eq!(quote(" padded"), "' padded'");
        assert_eq!(quote("it's"), "it's");
        assert_eq!(quote("'quoted'"), "'''quoted'''");
        assert_eq!(quote("{}"), "'{}'");
        assert_eq!(quote("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(quote("tab\there \"q\""), "\"tab\\there \\\"q\\\"\"");
        assert_eq!(quote("\u{7}"), "\"\\x07\"");
        assert_eq!(quote("+0x1F"), "'+0x1F'");
        assert_eq!(quote("..."), "'...'");
    }

    #[test]
    fn non_printable_characters_are_escaped() {
        assert_eq!(quote("\u{fffe}"), "\"\\uFFFE\"");
        assert_eq!(quote("a\u{ffff}"), "\"a\\uFFFF\"");
        assert_eq!(quote("\u{85}"), "\"\\x85\"");
        assert_eq!(quote("\u{9f}x"), "\"\\x9Fx\"");
        assert_eq!(quote("emoji \u{1f600}"), "emoji \u{1f600}");
    }

    #[test]
    fn long_keys_use_explicit_form() {
        let key = "k".repeat(1500);
        let mut map = Mapping::new();
        map.insert(key.clone(), 1i64);
        map.insert("short", 2i64);
        let text = render(&Value::Mapping(map));
        assert_eq!(text, format!("? {}\n: 1\nshort: 2\n", key));

        let back: serde_json::Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, serde_json::json!({ key: 1, "short": 2 }));
    }

    #[test]
    fn yaml_reader_gets_the_same_strings() {
        let cases = [
            "true", "yes", "No", "null", "~", "80", "-3", "1e5", ".inf", "-.nan", "0x1F", "+0x1F",
            "0o17", "1_000", "007", "2024-01-31", "12:30", "- item", "-", "key: value", "a #comment",
            " padded", "trailing ", "it's", "'quoted'", "\"dq\"", "{}", "[1, 2]", "line\nbreak",
            "tab\there", "\u{7}", "\u{fffe}", "\u{ffff}", "\u{85}", "\u{feff}bom", "\u{2028}",
            "...", "---", "?", "a: ", "ends:", "C:\\dir", "@at", "`tick", "%pct", "#", "&a", "*a",
            "!t", "|", ">", "=", "é ✓ 中文", "\u{1f600}", "",
        ];
        for case in cases {
            let mut map = Mapping::new();
            map.insert("v", case);
            map.insert(case, "k");
            let text = render(&Value::Mapping(map));
            let back: serde_json::Value = match serde_yaml::from_str(&text) {
                Ok(back) => back,
                Err(err) => panic!("{:?} rendered as unreadable {:?}: {}", case, text, err),
            };
            assert_eq!(back["v"], serde_json::json!(case), "{:?}", text);
            assert_eq!(back[case], serde_json::json!("k"), "{:?}", text);
        }
    }
}
