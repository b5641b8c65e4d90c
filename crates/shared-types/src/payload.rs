//! Defensive decoding of host payloads
//!
//! Every field is decoded on its own. A field that is absent, not valid JSON
//! or of the wrong shape yields the same default as if it had been omitted,
//! so a single bad attribute never aborts the whole update.

use crate::events::{
    ChannelUpdate, HostUpdate, ProjectionUpdate, SeriesUpdate, UPDATE_EVENT, VISIBILITY_EVENT,
};
use crate::{ChannelName, ProjectionConfig, UpdateContract, ViewMode};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

const TIME_KEY: &str = "time";
const VIEW_KEY: &str = "view";
const MASS_PROJECTION_SNAPSHOT_KEY: &str = "massProjection";
const MASS_PROJECTION_MESSAGE_KEY: &str = "mass_projection";
const ENERGY_PROJECTION_SNAPSHOT_KEY: &str = "energyProjection";
const ENERGY_PROJECTION_MESSAGE_KEY: &str = "energy_projection";

/// Every dataset key the snapshot path reads
pub fn snapshot_keys() -> Vec<&'static str> {
    let mut keys = vec![
        TIME_KEY,
        VIEW_KEY,
        MASS_PROJECTION_SNAPSHOT_KEY,
        ENERGY_PROJECTION_SNAPSHOT_KEY,
    ];
    for channel in ChannelName::ALL {
        keys.push(channel.snapshot_key());
        keys.push(channel.visibility_snapshot_key());
    }
    keys
}

/// Raw fields from either transport
pub enum RawFields<'a> {
    /// Dataset attributes, every value a JSON-encoded string
    Attributes(&'a HashMap<String, String>),
    /// Message payload with snake_case keys and native JSON values
    Message(&'a Map<String, Value>),
}

impl RawFields<'_> {
    fn field(&self, snapshot_key: &str, message_key: &str) -> Option<Value> {
        match self {
            RawFields::Attributes(attributes) => {
                attributes.get(snapshot_key).map(|raw| parse_lenient(snapshot_key, raw))
            }
            RawFields::Message(map) => match map.get(message_key)? {
                Value::String(raw) => Some(parse_lenient(message_key, raw)),
                value => Some(value.clone()),
            },
        }
    }

    fn has_field(&self, snapshot_key: &str, message_key: &str) -> bool {
        match self {
            RawFields::Attributes(attributes) => attributes.contains_key(snapshot_key),
            RawFields::Message(map) => map.contains_key(message_key),
        }
    }
}

/// JSON when it parses, the bare string otherwise
fn parse_lenient(key: &str, raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Field '{key}' is not JSON ({e}), keeping raw string");
            Value::String(raw.to_string())
        }
    }
}

fn number_list(key: &str, value: Option<Value>) -> Vec<f64> {
    let Some(value) = value else {
        return Vec::new();
    };
    let parsed = match &value {
        Value::Array(items) => items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>(),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        log::warn!("Field '{key}' is not a list of numbers, treating as empty");
        Vec::new()
    })
}

fn flag(key: &str, value: Option<Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        other => {
            log::warn!("Field '{key}' is not a boolean: {other}");
            None
        }
    }
}

fn projection(key: &str, value: Option<Value>) -> Option<ProjectionConfig> {
    let value = value?;
    match serde_json::from_value::<ProjectionConfig>(value) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Field '{key}' is not a projection config: {e}");
            None
        }
    }
}

fn view(value: Option<Value>) -> ViewMode {
    value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(ViewMode::parse)
        .unwrap_or_default()
}

/// Time axis plus every channel, defaults for anything missing
pub fn decode_series(fields: &RawFields<'_>) -> SeriesUpdate {
    let time = number_list(TIME_KEY, fields.field(TIME_KEY, TIME_KEY));
    let channels = ChannelName::ALL
        .iter()
        .map(|&channel| {
            let values = number_list(
                channel.snapshot_key(),
                fields.field(channel.snapshot_key(), channel.message_key()),
            );
            let visible = flag(
                channel.visibility_snapshot_key(),
                fields.field(channel.visibility_snapshot_key(), channel.visibility_message_key()),
            )
            .unwrap_or(true);
            (channel, ChannelUpdate { values, visible })
        })
        .collect();

    SeriesUpdate { time, channels }
}

pub fn decode_projection(fields: &RawFields<'_>) -> ProjectionUpdate {
    ProjectionUpdate {
        mass: projection(
            MASS_PROJECTION_SNAPSHOT_KEY,
            fields.field(MASS_PROJECTION_SNAPSHOT_KEY, MASS_PROJECTION_MESSAGE_KEY),
        ),
        energy: projection(
            ENERGY_PROJECTION_SNAPSHOT_KEY,
            fields.field(ENERGY_PROJECTION_SNAPSHOT_KEY, ENERGY_PROJECTION_MESSAGE_KEY),
        ),
        view: view(fields.field(VIEW_KEY, VIEW_KEY)),
    }
}

/// Only the flags that are present and well formed
pub fn decode_visibility(fields: &RawFields<'_>) -> BTreeMap<ChannelName, bool> {
    ChannelName::ALL
        .iter()
        .filter(|c| fields.has_field(c.visibility_snapshot_key(), c.visibility_message_key()))
        .filter_map(|&channel| {
            flag(
                channel.visibility_snapshot_key(),
                fields.field(channel.visibility_snapshot_key(), channel.visibility_message_key()),
            )
            .map(|visible| (channel, visible))
        })
        .collect()
}

/// Decode a full update according to the instance's contract
pub fn decode_update(fields: &RawFields<'_>, contract: UpdateContract) -> HostUpdate {
    match contract {
        UpdateContract::Timeline => HostUpdate::Series(decode_series(fields)),
        UpdateContract::Projection => HostUpdate::Projection(decode_projection(fields)),
    }
}

/// Decode a pushed message. Unknown events yield `None`.
pub fn decode_message(event: &str, payload: &Value, contract: UpdateContract) -> Option<HostUpdate> {
    let empty = Map::new();
    let map = match payload {
        Value::Object(map) => map,
        other => {
            log::warn!("Payload of '{event}' is not an object ({other}), using defaults");
            &empty
        }
    };
    let fields = RawFields::Message(map);

    match event {
        UPDATE_EVENT => Some(decode_update(&fields, contract)),
        VISIBILITY_EVENT => {
            // Single-channel form: {"channel": "energy", "visible": false}
            let single = map
                .get("channel")
                .and_then(Value::as_str)
                .and_then(ChannelName::parse)
                .zip(flag("visible", map.get("visible").cloned()));
            let flags = match single {
                Some((channel, visible)) => BTreeMap::from([(channel, visible)]),
                None => decode_visibility(&fields),
            };
            Some(HostUpdate::Visibility(flags))
        }
        _ => {
            log::debug!("Ignoring unknown event '{event}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_snapshot_decoding() {
        let attrs = attributes(&[
            ("time", "[0, 60, 120]"),
            ("mass", "[1, 2, 3]"),
            ("energy", "[10, 20, 30]"),
            ("buildPower", "[5, 5, 5]"),
            ("showMass", "true"),
            ("showEnergy", "false"),
        ]);
        let update = decode_series(&RawFields::Attributes(&attrs));

        assert_eq!(update.time, vec![0.0, 60.0, 120.0]);
        assert_eq!(update.channels[&ChannelName::Mass].values, vec![1.0, 2.0, 3.0]);
        assert!(!update.channels[&ChannelName::Energy].visible);
        // Absent flag defaults to visible
        assert!(update.channels[&ChannelName::BuildPower].visible);
    }

    #[test]
    fn test_malformed_field_matches_omitted_field() {
        let malformed = attributes(&[("time", "[1, 2]"), ("mass", "[1, 2"), ("showMass", "yes")]);
        let omitted = attributes(&[("time", "[1, 2]")]);

        assert_eq!(
            decode_series(&RawFields::Attributes(&malformed)),
            decode_series(&RawFields::Attributes(&omitted))
        );
    }

    #[test]
    fn test_non_numeric_entries_empty_the_channel() {
        let attrs = attributes(&[("time", "[1, 2]"), ("energy", "[1, \"two\"]")]);
        let update = decode_series(&RawFields::Attributes(&attrs));
        assert!(update.channels[&ChannelName::Energy].values.is_empty());
    }

    #[test]
    fn test_message_uses_snake_case_keys() {
        let payload = json!({
            "time": [1, 2],
            "build_power": [3, 4],
            "show_build_power": false,
            "buildPower": [9, 9]
        });
        let update = decode_message(UPDATE_EVENT, &payload, UpdateContract::Timeline).unwrap();

        let HostUpdate::Series(series) = update else {
            panic!("expected a series update");
        };
        let build = &series.channels[&ChannelName::BuildPower];
        assert_eq!(build.values, vec![3.0, 4.0]);
        assert!(!build.visible);
    }

    #[test]
    fn test_message_accepts_string_encoded_values() {
        let payload = json!({ "time": "[1, 2]", "mass": "[5, 6]", "show_mass": "false" });
        let Some(HostUpdate::Series(series)) =
            decode_message(UPDATE_EVENT, &payload, UpdateContract::Timeline)
        else {
            panic!("expected a series update");
        };
        assert_eq!(series.time, vec![1.0, 2.0]);
        assert!(!series.channels[&ChannelName::Mass].visible);
    }

    #[test]
    fn test_projection_decoding() {
        let attrs = attributes(&[
            ("massProjection", r#"{"rate": 10, "deadline": 300, "goal": 1000}"#),
            ("energyProjection", "not json"),
            ("view", "\"energy\""),
        ]);
        let update = decode_projection(&RawFields::Attributes(&attrs));

        assert_eq!(update.mass, Some(ProjectionConfig::new(10.0, 300.0, 1000.0)));
        assert_eq!(update.energy, None);
        assert_eq!(update.view, ViewMode::Energy);
    }

    #[test]
    fn test_bare_view_string_on_snapshot() {
        let attrs = attributes(&[("view", "energy")]);
        assert_eq!(decode_projection(&RawFields::Attributes(&attrs)).view, ViewMode::Energy);

        let attrs = attributes(&[("view", "fuel")]);
        assert_eq!(decode_projection(&RawFields::Attributes(&attrs)).view, ViewMode::Mass);
    }

    #[test]
    fn test_visibility_event_forms() {
        let single = json!({ "channel": "energy", "visible": false });
        assert_eq!(
            decode_message(VISIBILITY_EVENT, &single, UpdateContract::Timeline),
            Some(HostUpdate::Visibility(BTreeMap::from([(ChannelName::Energy, false)])))
        );

        let flags = json!({ "show_mass": false, "show_energy": "garbage" });
        assert_eq!(
            decode_message(VISIBILITY_EVENT, &flags, UpdateContract::Timeline),
            Some(HostUpdate::Visibility(BTreeMap::from([(ChannelName::Mass, false)])))
        );
    }

    #[test]
    fn test_unknown_event_and_non_object_payload() {
        assert_eq!(decode_message("other", &json!({}), UpdateContract::Timeline), None);

        let update = decode_message(UPDATE_EVENT, &json!(42), UpdateContract::Timeline).unwrap();
        let HostUpdate::Series(series) = update else {
            panic!("expected a series update");
        };
        assert!(series.time.is_empty());
        assert!(series.channels.values().all(|c| c.visible && c.values.is_empty()));
    }

    #[test]
    fn test_snapshot_keys_cover_every_channel() {
        let keys = snapshot_keys();
        for channel in ChannelName::ALL {
            assert!(keys.contains(&channel.snapshot_key()));
            assert!(keys.contains(&channel.visibility_snapshot_key()));
        }
        assert!(keys.contains(&"massProjection"));
    }
}
