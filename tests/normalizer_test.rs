use chrono::{DateTime, TimeZone, Utc};
use fluent_bridge::domain::document::render_timestamp;
use fluent_bridge::domain::{RawRecord, normalize_at};
use proptest::prelude::*;
use serde_json::{Map, Value};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()
}

fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::from),
    ]
}

fn raw_record() -> impl Strategy<Value = RawRecord> {
    prop::collection::vec(("[a-z_@]{1,12}", scalar_value()), 0..12)
        .prop_map(|pairs| pairs.into_iter().collect::<Map<String, Value>>())
}

proptest! {
    #[test]
    fn every_input_key_survives(raw in raw_record()) {
        let doc = normalize_at(raw.clone(), fixed_now());

        for key in raw.keys() {
            prop_assert!(doc.contains_key(key), "lost key {}", key);
        }
        prop_assert!(doc.contains_key("timestamp"));
        prop_assert!(doc.get("type").is_some_and(Value::is_string));
    }

    #[test]
    fn rendered_timestamp_matches_typed_timestamp(raw in raw_record()) {
        let doc = normalize_at(raw, fixed_now());
        let rendered = render_timestamp(doc.timestamp());
        prop_assert_eq!(doc.get_str("timestamp"), Some(rendered.as_str()));
    }

    #[test]
    fn normalization_is_deterministic_for_fixed_now(raw in raw_record()) {
        let first = normalize_at(raw.clone(), fixed_now()).into_value();
        let second = normalize_at(raw, fixed_now()).into_value();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn string_levels_are_lowercased(level in "[A-Za-z]{1,10}") {
        let mut raw = Map::new();
        raw.insert("level".to_string(), Value::String(level.clone()));

        let doc = normalize_at(raw, fixed_now());
        let expected = level.to_lowercase();
        prop_assert_eq!(doc.level(), Some(expected.as_str()));
    }

    #[test]
    fn plain_log_lines_become_trimmed_messages(line in "[a-zA-Z0-9 ]{0,40}") {
        let mut raw = Map::new();
        let log_line = format!("{line}\n");
        raw.insert("log".to_string(), Value::String(log_line.clone()));

        let doc = normalize_at(raw, fixed_now());
        prop_assert_eq!(doc.get_str("message"), Some(line.trim()));
        prop_assert_eq!(doc.get_str("log"), Some(log_line.as_str()));
    }

    #[test]
    fn forwarder_timestamp_round_trips(secs in 0i64..4_102_444_800, nanos in 0u32..1_000_000_000) {
        let ts = Utc.timestamp_opt(secs, nanos).unwrap();
        let mut raw = Map::new();
        raw.insert("@timestamp".to_string(), Value::String(render_timestamp(ts)));

        let doc = normalize_at(raw, fixed_now());
        prop_assert_eq!(doc.timestamp(), ts);
    }
}
