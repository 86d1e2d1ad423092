//! Decoding and encoding of persisted records
//!
//! Two shapes are accepted on read:
//! - a mapping keyed by field name (current format), where any subset of the
//!   known keys may be present
//! - the positional form `[car_model, incidents_count, position_in_race, track_name]`
//!   written by the first revision of the document format
//!
//! Missing keys and JSON `null` both fall back to the field default. Only
//! structural problems (not a mapping, wrong primitive type) are errors.

use serde_json::{Map, Value};

use super::{RaceResult, RemoteDetails, SchemaError};

/// Keys that only remotely sourced records carry
pub const REMOTE_KEYS: &[&str] = &[
    "series_name",
    "start_position",
    "finish_position",
    "points",
    "strength_of_field",
    "oldi_rating",
    "newi_rating",
    "laps_led",
    "car_id",
    "session_start",
];

/// Positional order used by the legacy tuple form
const POSITIONAL_FIELDS: [&str; 4] = [
    "car_model",
    "incidents_count",
    "position_in_race",
    "track_name",
];

/// Decode one raw record
pub fn decode(raw: &Value) -> Result<RaceResult, SchemaError> {
    match raw {
        Value::Object(map) => decode_mapping(map),
        Value::Array(items) => decode_positional(items),
        other => Err(SchemaError::NotAMapping(kind_name(other))),
    }
}

/// Encode a record into its mapping form.
///
/// `decode(&encode(r)) == r` holds for every normalized record.
pub fn encode(record: &RaceResult) -> Value {
    let mut map = Map::new();
    map.insert("car_model".into(), Value::from(record.car_model.as_str()));
    map.insert("incidents_count".into(), Value::from(record.incidents_count));
    map.insert(
        "position_in_race".into(),
        record.position_in_race.map_or(Value::Null, Value::from),
    );
    map.insert("track_name".into(), Value::from(record.track_name.as_str()));

    if let Some(remote) = &record.remote {
        map.insert("series_name".into(), Value::from(remote.series_name.as_str()));
        map.insert("start_position".into(), Value::from(remote.start_position));
        map.insert("finish_position".into(), Value::from(remote.finish_position));
        map.insert("points".into(), Value::from(remote.points));
        map.insert("strength_of_field".into(), Value::from(remote.strength_of_field));
        map.insert("oldi_rating".into(), Value::from(remote.oldi_rating));
        map.insert("newi_rating".into(), Value::from(remote.newi_rating));
        map.insert("laps_led".into(), Value::from(remote.laps_led));
        map.insert("car_id".into(), Value::from(remote.car_id));
        map.insert(
            "session_start".into(),
            Value::from(remote.session_start.as_str()),
        );
    }

    Value::Object(map)
}

fn decode_mapping(map: &Map<String, Value>) -> Result<RaceResult, SchemaError> {
    let field = |key: &str| map.get(key).filter(|v| !v.is_null());

    let remote = if REMOTE_KEYS.iter().any(|key| field(key).is_some()) {
        Some(RemoteDetails {
            series_name: string_field(field("series_name"), "series_name")?,
            start_position: u32_field(field("start_position"), "start_position")?,
            finish_position: u32_field(field("finish_position"), "finish_position")?,
            points: u32_field(field("points"), "points")?,
            strength_of_field: u32_field(field("strength_of_field"), "strength_of_field")?,
            oldi_rating: i32_field(field("oldi_rating"), "oldi_rating")?,
            newi_rating: i32_field(field("newi_rating"), "newi_rating")?,
            laps_led: u32_field(field("laps_led"), "laps_led")?,
            car_id: u32_field(field("car_id"), "car_id")?,
            session_start: string_field(field("session_start"), "session_start")?,
        })
    } else {
        None
    };

    Ok(RaceResult {
        car_model: string_field(field("car_model"), "car_model")?,
        incidents_count: u32_field(field("incidents_count"), "incidents_count")?,
        position_in_race: position_field(field("position_in_race"))?,
        track_name: string_field(field("track_name"), "track_name")?,
        remote,
    })
}

fn decode_positional(items: &[Value]) -> Result<RaceResult, SchemaError> {
    if items.len() > POSITIONAL_FIELDS.len() {
        return Err(SchemaError::OutOfRange {
            field: "results_history",
            value: format!("{} positional fields", items.len()),
        });
    }

    let item = |idx: usize| items.get(idx).filter(|v| !v.is_null());

    Ok(RaceResult {
        car_model: string_field(item(0), POSITIONAL_FIELDS[0])?,
        incidents_count: u32_field(item(1), POSITIONAL_FIELDS[1])?,
        position_in_race: position_field(item(2))?,
        track_name: string_field(item(3), POSITIONAL_FIELDS[3])?,
        remote: None,
    })
}

fn string_field(value: Option<&Value>, field: &'static str) -> Result<String, SchemaError> {
    match value {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SchemaError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn u32_field(value: Option<&Value>, field: &'static str) -> Result<u32, SchemaError> {
    let Some(value) = value else {
        return Ok(0);
    };
    let Value::Number(number) = value else {
        return Err(SchemaError::WrongType {
            field,
            expected: "non-negative integer",
        });
    };

    if let Some(n) = number.as_u64() {
        u32::try_from(n).map_err(|_| SchemaError::OutOfRange {
            field,
            value: n.to_string(),
        })
    } else if number.is_i64() {
        Err(SchemaError::OutOfRange {
            field,
            value: number.to_string(),
        })
    } else {
        Err(SchemaError::WrongType {
            field,
            expected: "non-negative integer",
        })
    }
}

fn i32_field(value: Option<&Value>, field: &'static str) -> Result<i32, SchemaError> {
    let Some(value) = value else {
        return Ok(0);
    };
    let n = value.as_i64().ok_or(SchemaError::WrongType {
        field,
        expected: "integer",
    })?;
    i32::try_from(n).map_err(|_| SchemaError::OutOfRange {
        field,
        value: n.to_string(),
    })
}

fn position_field(value: Option<&Value>) -> Result<Option<u32>, SchemaError> {
    let position = u32_field(value, "position_in_race")?;
    Ok((position > 0).then_some(position))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
