/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::collections::HashMap;
pub use tinyjson::JsonValue::{
    self, Array as JsonArray, Number as JsonNum, Object as JsonObj, String as JsonStr,
};

use crate::{Error, Result};

// helper functions
pub fn json_map<const N: usize>(vals: [(&str, JsonValue); N]) -> JsonValue {
    JsonObj(HashMap::from(vals.map(|(k, v)| (k.to_string(), v))))
}

pub fn json_str(val: &str) -> JsonValue {
    JsonStr(val.to_string())
}

/// Fetch a field of a JSON object, `None` if the value is not an object
/// or the field is absent.
pub fn json_field<'a>(value: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    value.get::<HashMap<String, JsonValue>>().and_then(|m| m.get(key))
}

/// Fetch a string field of a JSON object or fail with context.
pub fn json_field_str<'a>(value: &'a JsonValue, key: &str) -> Result<&'a str> {
    match json_field(value, key).and_then(|v| v.get::<String>()) {
        Some(s) => Ok(s.as_str()),
        None => Err(Error::UnexpectedJsonRpc(format!("Missing string field \"{key}\""))),
    }
}

/// Interpret a JSON value as a string or fail with context.
pub fn json_as_str<'a>(value: &'a JsonValue, what: &str) -> Result<&'a str> {
    match value.get::<String>() {
        Some(s) => Ok(s.as_str()),
        None => Err(Error::UnexpectedJsonRpc(format!("Expected a string for {what}"))),
    }
}

/// Interpret a JSON value as an array or fail with context.
pub fn json_as_array<'a>(value: &'a JsonValue, what: &str) -> Result<&'a Vec<JsonValue>> {
    match value.get::<Vec<JsonValue>>() {
        Some(a) => Ok(a),
        None => Err(Error::UnexpectedJsonRpc(format!("Expected an array for {what}"))),
    }
}
