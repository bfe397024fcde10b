//! Lenient serde helpers for legacy customization payloads
//!
//! Stored payloads predate the typed schema and show up with mixed shapes:
//! lists where maps are expected, maps where lists are expected, slot maps
//! keyed by either integers or strings, quantities as numbers or numeric
//! strings. Coercion happens here, field by field, exactly once at
//! deserialization time; a field that cannot be coerced becomes empty and is
//! logged, never an error.

use crate::models::IngredientPreference;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Deserialize a list of strings, accepting legacy shapes:
/// array of strings/numbers, map with truthy values (keys become entries),
/// bare string, or null.
pub fn lenient_string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::string_list(&value))
}

/// Deserialize a `drink_id → quantity` map, accepting integer, float and
/// numeric-string quantities, or an array of ids (each counted once).
pub fn lenient_qty_map<'de, D>(d: D) -> Result<BTreeMap<String, i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::qty_map(&value))
}

/// Deserialize a `name → price` map with numeric or numeric-string values.
pub fn lenient_price_map<'de, D>(d: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::price_map(&value))
}

/// Deserialize an `ingredient → preference` map; booleans map to
/// `Wanted`/`None`, unknown strings to `Neutral`.
pub fn lenient_pref_map<'de, D>(d: D) -> Result<BTreeMap<String, IngredientPreference>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::pref_map(&value))
}

/// Deserialize a slot-indexed map of strings. Accepts integer or string
/// keys, or a plain array (positions become indices).
pub fn slot_string_map<'de, D>(d: D) -> Result<BTreeMap<u32, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::slot_map(&value, |v| v.as_str().map(str::to_owned)))
}

/// Deserialize a slot-indexed map of supplement-name lists.
pub fn slot_list_map<'de, D>(d: D) -> Result<BTreeMap<u32, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::slot_map(&value, |v| Some(coerce::string_list(v))))
}

/// Deserialize a slot-indexed map of ingredient-preference maps.
pub fn slot_pref_map<'de, D>(
    d: D,
) -> Result<BTreeMap<u32, BTreeMap<String, IngredientPreference>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(coerce::slot_map(&value, |v| Some(coerce::pref_map(v))))
}

/// Value-level coercion primitives, shared with `Customizations::migrate`.
pub mod coerce {
    use super::*;

    fn truthy(value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
            Value::Null => false,
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn as_i32(value: &Value) -> Option<i32> {
        match value {
            Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
            Value::Bool(true) => Some(1),
            Value::Bool(false) => Some(0),
            _ => None,
        }
    }

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn string_list(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            // Legacy shape: map of name → truthy flag
            Value::Object(map) => map
                .iter()
                .filter(|(_, v)| truthy(v))
                .map(|(k, _)| k.clone())
                .collect(),
            Value::String(s) if !s.is_empty() => vec![s.clone()],
            Value::Null => Vec::new(),
            other => {
                warn!(value = %other, "Uncoercible string list in payload, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn qty_map(value: &Value) -> BTreeMap<String, i32> {
        match value {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| as_i32(v).map(|q| (k.clone(), q)))
                .collect(),
            // Legacy shape: list of ids, each counted once
            Value::Array(items) => {
                let mut out = BTreeMap::new();
                for id in items.iter().filter_map(|v| v.as_str()) {
                    *out.entry(id.to_owned()).or_insert(0) += 1;
                }
                out
            }
            Value::Null => BTreeMap::new(),
            other => {
                warn!(value = %other, "Uncoercible quantity map in payload, treating as empty");
                BTreeMap::new()
            }
        }
    }

    pub fn price_map(value: &Value) -> BTreeMap<String, f64> {
        match value {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| as_f64(v).map(|p| (k.clone(), p)))
                .collect(),
            Value::Null => BTreeMap::new(),
            other => {
                warn!(value = %other, "Uncoercible price map in payload, treating as empty");
                BTreeMap::new()
            }
        }
    }

    pub fn preference(value: &Value) -> Option<IngredientPreference> {
        match value {
            Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "WANTED" => Some(IngredientPreference::Wanted),
                "LESS" => Some(IngredientPreference::Less),
                "NONE" => Some(IngredientPreference::None),
                "NEUTRAL" | "" => Some(IngredientPreference::Neutral),
                _ => None,
            },
            Value::Bool(true) => Some(IngredientPreference::Wanted),
            Value::Bool(false) => Some(IngredientPreference::None),
            _ => None,
        }
    }

    pub fn pref_map(value: &Value) -> BTreeMap<String, IngredientPreference> {
        match value {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| preference(v).map(|p| (k.clone(), p)))
                .collect(),
            Value::Null => BTreeMap::new(),
            other => {
                warn!(value = %other, "Uncoercible preference map in payload, treating as empty");
                BTreeMap::new()
            }
        }
    }

    fn slot_index(key: &str) -> Option<u32> {
        key.trim().parse::<u32>().ok()
    }

    pub fn slot_map<T>(value: &Value, mut item: impl FnMut(&Value) -> Option<T>) -> BTreeMap<u32, T> {
        match value {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| {
                    let idx = slot_index(k).or_else(|| {
                        warn!(key = %k, "Non-numeric slot key in payload, dropping entry");
                        Option::None
                    })?;
                    item(v).map(|t| (idx, t))
                })
                .collect(),
            // Legacy shape: positional array
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| item(v).map(|t| (i as u32, t)))
                .collect(),
            Value::Null => BTreeMap::new(),
            other => {
                warn!(value = %other, "Uncoercible slot map in payload, treating as empty");
                BTreeMap::new()
            }
        }
    }
}
