// Chirp - An object-oriented client for the Twitter REST and Streaming APIs
// Copyright (C) 2025 Chirp Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Response body formats
//!
//! Most operations answer in JSON. The OAuth handshake answers with an
//! `application/x-www-form-urlencoded` body. A format also decides which
//! extension is appended to the operation URL.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Callback used by [`Format::External`]
pub type DecodeFn = Arc<dyn Fn(&str) -> Result<Value> + Send + Sync>;

/// How a response body is turned into a value
#[derive(Clone, Default)]
pub enum Format {
    /// JSON body; blank input (stream keep-alive) decodes to nothing
    #[default]
    Json,
    /// Form-urlencoded body; blank input decodes to an empty object
    Form,
    /// Caller-supplied decoder; blank input decodes to nothing
    External(DecodeFn),
}

impl Format {
    /// Wrap a decoding callback
    pub fn external<F>(decode: F) -> Self
    where
        F: Fn(&str) -> Result<Value> + Send + Sync + 'static,
    {
        Format::External(Arc::new(decode))
    }

    /// URL extension requested by this format, without the leading dot
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Format::Json => Some("json"),
            Format::Form | Format::External(_) => None,
        }
    }

    /// Decode one body or one stream line
    pub fn decode(&self, data: &str) -> Result<Option<Value>> {
        let data = data.trim();
        match self {
            Format::Json if data.is_empty() => Ok(None),
            Format::Json => Ok(Some(serde_json::from_str(data)?)),
            Format::Form if data.is_empty() => Ok(Some(Value::Object(Map::new()))),
            Format::Form => parse_form(data).map(|map| Some(Value::Object(map))),
            Format::External(_) if data.is_empty() => Ok(None),
            Format::External(decode) => (decode.as_ref())(data).map(Some),
        }
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("Json"),
            Format::Form => f.write_str("Form"),
            Format::External(_) => f.write_str("External(..)"),
        }
    }
}

/// Strict form parsing: every field must be `key=value`, blank values allowed.
fn parse_form(data: &str) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in data.split('&') {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::Codec(format!("bad form field: {:?}", pair)))?;
        fields.insert(decode_component(key)?, Value::String(decode_component(value)?));
    }
    Ok(fields)
}

fn decode_component(raw: &str) -> Result<String> {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::Codec(e.to_string()))
}
