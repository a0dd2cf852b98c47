//! Tolerant field deserializers for model-produced itineraries.
//!
//! Models routinely emit numbers as strings, a single string where a list was
//! asked for, or coordinates as objects. These helpers are the one place such
//! shapes are coerced; anything they cannot read becomes `None` (or is skipped
//! in a list) instead of failing the whole document.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::itinerary::Coordinates;

/// Numeric field: accepts numbers and numeric strings. `"free"` and other text reads as `None`.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Small positive counts (days, travelers). Accepts `3`, `3.0`, `"3"`, `"3天"`, `"Day 3"`.
pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

fn count_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Free text. Numbers and booleans are rendered, string lists are joined.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(text_from_value))
}

/// Required text; missing or unreadable values become the empty string.
pub fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text(deserializer)?.unwrap_or_default())
}

fn text_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(text_from_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// `[lng, lat]`, `{"lng":..,"lat":..}` (also `lon`/`longitude`/`latitude`) or `"lng,lat"`.
pub fn coordinates<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coordinates_from_value))
}

pub(crate) fn coordinates_from_value(value: &Value) -> Option<Coordinates> {
    let (lng, lat) = match value {
        Value::Array(items) if items.len() == 2 => {
            (number_from_value(&items[0])?, number_from_value(&items[1])?)
        }
        Value::Object(map) => {
            let pick = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(number_from_value));
            (pick(&["lng", "lon", "longitude"])?, pick(&["lat", "latitude"])?)
        }
        Value::String(s) => {
            let mut parts = s.split(|c| c == ',' || c == '，').map(str::trim);
            let lng = parts.next()?.parse().ok()?;
            let lat = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            (lng, lat)
        }
        _ => return None,
    };
    Coordinates::new(lng, lat)
}

/// List whose malformed elements are dropped. A non-list value is a shape error.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = list_items::<D>(deserializer)?;
    Ok(items.into_iter().filter_map(element::<T>).collect())
}

/// Like [`seq`], but bare strings (alone or in the list) are promoted to `{"name": <string>}`.
pub fn named_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) => vec![Value::String(name)],
        Some(Value::Array(items)) => items,
        Some(Value::Object(obj)) => vec![Value::Object(obj)],
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a list, found {}",
                value_kind(&other)
            )))
        }
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::String(name) => serde_json::json!({ "name": name }),
            other => other,
        })
        .filter_map(element::<T>)
        .collect())
}

/// Optional list: absent or `null` stays `None`, present lists are read leniently.
pub fn opt_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.into_iter().filter_map(element::<T>).collect())),
        Some(Value::Object(obj)) => Ok(element::<T>(Value::Object(obj)).map(|item| vec![item])),
        Some(other) => Err(D::Error::custom(format!(
            "expected a list, found {}",
            value_kind(&other)
        ))),
    }
}

/// Optional nested record; values of the wrong shape read as `None`.
pub fn record<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(name)) => element::<T>(serde_json::json!({ "name": name })),
        Some(value @ Value::Object(_)) => element::<T>(value),
        _ => None,
    })
}

fn list_items<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        // A single record where a list was asked for.
        Some(Value::Object(obj)) => Ok(vec![Value::Object(obj)]),
        Some(other) => Err(D::Error::custom(format!(
            "expected a list, found {}",
            value_kind(&other)
        ))),
    }
}

fn element<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(item) => Some(item),
        Err(err) => {
            debug!(target: "tripagent::reconcile", error = %err, "dropping unreadable list element");
            None
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_rejects_free_text() {
        assert_eq!(number_from_value(&json!(35)), Some(35.0));
        assert_eq!(number_from_value(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(number_from_value(&json!("free")), None);
        assert_eq!(number_from_value(&json!("免费")), None);
    }

    #[test]
    fn test_count_reads_labels() {
        assert_eq!(count_from_value(&json!(3)), Some(3));
        assert_eq!(count_from_value(&json!(2.0)), Some(2));
        assert_eq!(count_from_value(&json!("Day 4")), Some(4));
        assert_eq!(count_from_value(&json!("第2天")), Some(2));
        assert_eq!(count_from_value(&json!(-1)), None);
    }

    #[test]
    fn test_coordinates_shapes() {
        let expected = Coordinates::new(139.7454, 35.6586);
        assert_eq!(coordinates_from_value(&json!([139.7454, 35.6586])), expected);
        assert_eq!(coordinates_from_value(&json!({"lng": 139.7454, "lat": 35.6586})), expected);
        assert_eq!(
            coordinates_from_value(&json!({"longitude": "139.7454", "latitude": "35.6586"})),
            expected
        );
        assert_eq!(coordinates_from_value(&json!("139.7454, 35.6586")), expected);
        assert_eq!(coordinates_from_value(&json!([1.0])), None);
        assert_eq!(coordinates_from_value(&json!([500.0, 35.0])), None);
    }

    #[test]
    fn test_text_joins_lists() {
        assert_eq!(
            text_from_value(json!(["bring cash", "go early"])),
            Some("bring cash; go early".to_string())
        );
        assert_eq!(text_from_value(json!(90)), Some("90".to_string()));
        assert_eq!(text_from_value(json!({"a": 1})), None);
    }
}
