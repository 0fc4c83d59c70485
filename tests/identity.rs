use std::collections::BTreeMap;
use std::ops::Range;

use rand::{distributions::Alphanumeric, seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

/// Strings a careless writer would emit unquoted, or unescaped, and a YAML
/// reader would then reject or read back as something else.
const TRICKY_STRINGS: &[&str] = &[
    "",
    " ",
    "true",
    "False",
    "yes",
    "off",
    "null",
    "~",
    "0",
    "-1",
    "007",
    "1e5",
    "1.0",
    ".inf",
    "-.nan",
    "0x1F",
    "1_000",
    "2024-01-31",
    "12:30:00",
    "- dash",
    "-",
    "key: value",
    "ends with colon:",
    "# hash",
    "a #comment",
    "{}",
    "[]",
    "[1, 2]",
    "&anchor",
    "*alias",
    "!tag",
    "|",
    ">",
    "'single'",
    "\"double\"",
    "it's",
    "back\\slash",
    "line\nbreak",
    "tab\there",
    "trailing space ",
    "\u{0}\u{7}\u{1b}",
    "\u{feff}bom",
    "\u{2028}",
    "\u{85}",
    "\u{9f}",
    "\u{fffe}",
    "x\u{ffff}",
    "\u{1d11e} clef",
    "emoji \u{1f600}",
    "unicode é ✓ 中文",
    "0.0.0.0",
    "http://localhost:8086/write?db=x",
    "C:\\Program Files",
];

fn rand_string(rng: &mut impl Rng, range: Range<usize>) -> String {
    let len = rng.gen_range(range);
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

fn random_string(rng: &mut impl Rng) -> String {
    if rng.gen_bool(0.3) {
        TRICKY_STRINGS.choose(rng).unwrap().to_string()
    } else {
        rand_string(rng, 1..12)
    }
}

fn random_scalar(rng: &mut impl Rng) -> Json {
    match rng.gen_range(0..6) {
        0 => Json::Null,
        1 => Json::Bool(rng.gen()),
        2 => json!(rng.gen::<i64>()),
        3 => json!(rng.gen::<u64>()),
        // Start from integers so every value is exactly representable
        4 => json!(rng.gen::<i32>() as f64 / 16.0),
        5 => Json::String(random_string(rng)),
        _ => unreachable!(),
    }
}

fn random_value(rng: &mut impl Rng, depth: usize) -> Json {
    if depth == 0 || rng.gen_bool(0.5) {
        return random_scalar(rng);
    }
    match rng.gen_range(0..2) {
        0 => Json::Array(
            (0..rng.gen_range(0..5))
                .map(|_| random_value(rng, depth - 1))
                .collect(),
        ),
        _ => Json::Object(random_map(rng, depth - 1)),
    }
}

fn random_map(rng: &mut impl Rng, depth: usize) -> Map<String, Json> {
    (0..rng.gen_range(0..6))
        .map(|_| (random_string(rng), random_value(rng, depth)))
        .collect()
}

#[test]
fn identity() {
    let dir = tempfile::tempdir().unwrap();
    let store = configgen::FileStore::new(dir.path().join("config.yaml"));
    let mut rng = rand::thread_rng();

    for _ in 0..1_000 {
        let expected = Json::Object(random_map(&mut rng, 4));
        store.write(&expected).unwrap();

        let text = String::from_utf8(store.read().unwrap().bytes).unwrap();
        let actual: Json = match serde_yaml::from_str(&text) {
            Ok(actual) => actual,
            Err(err) => panic!("failed to parse {:?}: {}", text, err),
        };
        pretty_assertions::assert_eq!(expected, actual, "document:\n{}", text);
    }
}

#[test]
fn idempotent_render() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let doc = Json::Object(random_map(&mut rng, 3));
        let first = configgen::to_string(&doc).unwrap();
        let reparsed: configgen::Value = serde_yaml::from_str(&first).unwrap();
        assert_eq!(configgen::to_string(&reparsed).unwrap(), first);
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Output {
    Csv,
    Influx { host: String, port: u16, bucket: String },
    Chronos(String),
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Hardware {
    #[serde(rename = "type")]
    kind: String,
    channels: BTreeMap<String, String>,
    sampling_freq: Option<u32>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct TestConfig {
    test_name: String,
    sampling_frequency: f64,
    metadata: Option<String>,
    outputs: Vec<Output>,
    hardware: Vec<Hardware>,
    commands: Vec<Vec<String>>,
}

#[test]
fn typed_document() {
    let expected = TestConfig {
        test_name: "thermal soak".into(),
        sampling_frequency: 10.0,
        metadata: None,
        outputs: vec![
            Output::Csv,
            Output::Influx {
                host: "10.0.0.5".into(),
                port: 8086,
                bucket: "lab".into(),
            },
            Output::Chronos("true".into()),
        ],
        hardware: vec![
            Hardware {
                kind: "NIDAQ".into(),
                channels: [("ai0".into(), "temp".into()), ("ai1".into(), "".into())]
                    .into_iter()
                    .collect(),
                sampling_freq: Some(5000),
            },
            Hardware {
                kind: "ADAM".into(),
                channels: BTreeMap::new(),
                sampling_freq: None,
            },
        ],
        commands: vec![vec!["start".into(), "--fast".into()], vec![]],
    };

    let dir = tempfile::tempdir().unwrap();
    let store = configgen::FileStore::new(dir.path().join("test.yaml"));
    store.write(&expected).unwrap();
    let actual: TestConfig = store.load().unwrap();
    pretty_assertions::assert_eq!(expected, actual);
}
