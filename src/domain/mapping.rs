// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Type Mapping Logic
//!
//! This module is the "Translator" between Oracle column types and the
//! portable type description used in the catalog.
//!
//! We map each Oracle type to two things:
//! 1. **Portable type**: a JSON-Schema style description (e.g. `{"type": ["integer", "null"]}`).
//! 2. **Value domain**: numeric, temporal, lexical or boolean. This decides
//!    which resume values may be compared against an ordering column.

use crate::domain::entities::ValueDomain;
use oracle::sql_type::OracleType;
use serde_json::json;

/// The portable type a column's values are emitted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortableType {
    Integer,
    Number,
    String,
    DateTime,
    /// RAW / BLOB, emitted as base64 strings.
    Binary,
    Boolean,
}

impl PortableType {
    pub fn domain(&self) -> Option<ValueDomain> {
        match self {
            PortableType::Integer | PortableType::Number => Some(ValueDomain::Numeric),
            PortableType::String => Some(ValueDomain::Lexical),
            PortableType::DateTime => Some(ValueDomain::Temporal),
            PortableType::Boolean => Some(ValueDomain::Boolean),
            PortableType::Binary => None,
        }
    }

    /// Renders the JSON-Schema style description, adding `"null"` for nullable columns.
    pub fn to_json(&self, nullable: bool) -> serde_json::Value {
        let base = match self {
            PortableType::Integer => "integer",
            PortableType::Number => "number",
            PortableType::Boolean => "boolean",
            PortableType::String | PortableType::DateTime | PortableType::Binary => "string",
        };
        let types = if nullable {
            json!([base, "null"])
        } else {
            json!([base])
        };
        match self {
            PortableType::DateTime => json!({"type": types, "format": "date-time"}),
            PortableType::Binary => json!({"type": types, "contentEncoding": "base64"}),
            _ => json!({"type": types}),
        }
    }
}

/// Maps a driver-reported Oracle type (plus the dictionary type name) to a portable type.
pub fn map_oracle_type(oracle_type: &OracleType, raw_type: Option<&str>) -> PortableType {
    // 1. Check for special types
    if let Some(t) = map_special_type(raw_type) {
        return t;
    }

    // 2. Standard Oracle types
    match oracle_type {
        OracleType::Number(prec, scale) => map_number_type(*prec, *scale),
        OracleType::Int64 | OracleType::UInt64 => PortableType::Integer,
        OracleType::Float(_) | OracleType::BinaryFloat | OracleType::BinaryDouble => {
            PortableType::Number
        }

        OracleType::Char(_)
        | OracleType::NChar(_)
        | OracleType::Varchar2(_)
        | OracleType::NVarchar2(_)
        | OracleType::Long
        | OracleType::CLOB
        | OracleType::NCLOB
        | OracleType::Rowid => PortableType::String,

        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => PortableType::DateTime,

        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB | OracleType::BFILE => {
            PortableType::Binary
        }

        OracleType::Boolean => PortableType::Boolean,

        _ => PortableType::String,
    }
}

/// Maps a data dictionary type name (`ALL_TAB_COLUMNS.DATA_TYPE`) when no
/// driver type is available.
pub fn map_raw_type(raw_type: &str, scale: Option<i64>) -> PortableType {
    if let Some(t) = map_special_type(Some(raw_type)) {
        return t;
    }
    let upper = raw_type.to_uppercase();
    let base = upper.split('(').next().unwrap_or("").trim();
    match base {
        "NUMBER" | "INTEGER" => match scale {
            Some(0) => PortableType::Integer,
            _ => PortableType::Number,
        },
        "FLOAT" | "BINARY_FLOAT" | "BINARY_DOUBLE" => PortableType::Number,
        "DATE" => PortableType::DateTime,
        "RAW" | "LONG RAW" | "BLOB" | "BFILE" => PortableType::Binary,
        _ if base.starts_with("TIMESTAMP") => PortableType::DateTime,
        _ => PortableType::String,
    }
}

fn map_special_type(raw_type: Option<&str>) -> Option<PortableType> {
    let upper = raw_type?.to_uppercase();
    if upper.contains("XMLTYPE") || upper.contains("SDO_GEOMETRY") || upper.contains("ROWID") {
        return Some(PortableType::String);
    }
    if upper.contains("JSON") {
        return Some(PortableType::String);
    }
    if upper.contains("BOOLEAN") {
        return Some(PortableType::Boolean);
    }
    None
}

fn map_number_type(prec: u8, scale: i8) -> PortableType {
    // NUMBER without precision is reported as (0, -127)
    if prec > 0 && scale == 0 {
        PortableType::Integer
    } else {
        PortableType::Number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_numbers() {
        assert_eq!(
            map_oracle_type(&OracleType::Number(10, 0), None),
            PortableType::Integer
        );
        assert_eq!(
            map_oracle_type(&OracleType::Number(10, 2), None),
            PortableType::Number
        );
        assert_eq!(
            map_oracle_type(&OracleType::Number(0, -127), None),
            PortableType::Number
        );
        assert_eq!(
            map_oracle_type(&OracleType::BinaryDouble, None),
            PortableType::Number
        );
    }

    #[test]
    fn test_map_raw_types() {
        assert_eq!(
            map_oracle_type(&OracleType::CLOB, Some("XMLTYPE")),
            PortableType::String
        );
        assert_eq!(
            map_oracle_type(&OracleType::Boolean, Some("BOOLEAN")),
            PortableType::Boolean
        );
        assert_eq!(map_raw_type("NUMBER", Some(0)), PortableType::Integer);
        assert_eq!(map_raw_type("NUMBER", None), PortableType::Number);
        assert_eq!(
            map_raw_type("TIMESTAMP(6) WITH TIME ZONE", None),
            PortableType::DateTime
        );
        assert_eq!(map_raw_type("VARCHAR2", None), PortableType::String);
    }

    #[test]
    fn test_map_dates() {
        assert_eq!(map_oracle_type(&OracleType::Date, None), PortableType::DateTime);
        assert_eq!(
            map_oracle_type(&OracleType::TimestampTZ(6), None),
            PortableType::DateTime
        );
        assert_eq!(
            PortableType::DateTime.domain(),
            Some(ValueDomain::Temporal)
        );
    }

    #[test]
    fn test_to_json_nullability() {
        assert_eq!(
            PortableType::Integer.to_json(true),
            json!({"type": ["integer", "null"]})
        );
        assert_eq!(
            PortableType::DateTime.to_json(false),
            json!({"type": ["string"], "format": "date-time"})
        );
        assert_eq!(PortableType::Binary.domain(), None);
    }
}
