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

//! # Domain Entities
//!
//! Entities are the "Nouns" of the tap: values, records, table references,
//! read requests, catalog entries and per-stream results.
//!
//! We use the `serde` crate (Serialize/Deserialize) so records and catalog
//! entries can be written as JSON, and so resume values can be read
//! straight out of a YAML or JSON config file.

use crate::domain::errors::{Result, TapError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// The comparison domain of a column or value.
///
/// Resume values are only compared against ordering columns of the same domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueDomain {
    Numeric,
    Temporal,
    Lexical,
    Boolean,
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDomain::Numeric => write!(f, "numeric"),
            ValueDomain::Temporal => write!(f, "temporal"),
            ValueDomain::Lexical => write!(f, "lexical"),
            ValueDomain::Boolean => write!(f, "boolean"),
        }
    }
}

/// A scalar column value.
///
/// `String` is listed before the temporal variants so that untagged
/// deserialization keeps config strings as strings; they are coerced to a
/// temporal value later, once the ordering column's domain is known.
///
/// Numbers compare by value across `Int`, `Decimal` and `Float`; values of
/// unrelated kinds are unordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// `BINARY_FLOAT` / `BINARY_DOUBLE` only.
    Float(f64),
    String(String),
    /// Oracle `NUMBER` that does not fit an `i64`, kept digit for digit.
    Decimal(Decimal),
    /// Oracle `DATE` / `TIMESTAMP` (no time zone).
    DateTime(NaiveDateTime),
    /// Oracle `TIMESTAMP WITH [LOCAL] TIME ZONE`, normalized to UTC.
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the comparison domain, or `None` for SQL NULL.
    pub fn domain(&self) -> Option<ValueDomain> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueDomain::Boolean),
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => Some(ValueDomain::Numeric),
            Value::String(_) => Some(ValueDomain::Lexical),
            Value::DateTime(_) | Value::Timestamp(_) => Some(ValueDomain::Temporal),
        }
    }

    /// Converts a value into the given domain so it can be bound against a
    /// column of that domain.
    ///
    /// Strings are parsed into numbers or date-times; anything else that
    /// crosses domains is a configuration error.
    pub fn coerce_to(self, target: ValueDomain) -> Result<Value> {
        let current = match self.domain() {
            Some(d) => d,
            None => {
                return Err(TapError::ConfigError(
                    "resume value must not be null".to_string(),
                ))
            }
        };
        if current == target {
            return Ok(self);
        }

        match (self, target) {
            (Value::String(s), ValueDomain::Numeric) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Ok(Value::Int(i))
                } else if let Some(d) = Decimal::parse(trimmed) {
                    Ok(Value::Decimal(d))
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    Ok(Value::Float(f))
                } else {
                    Err(TapError::ConfigError(format!(
                        "resume value '{}' is not numeric",
                        s
                    )))
                }
            }
            (Value::String(s), ValueDomain::Temporal) => parse_temporal(&s).ok_or_else(|| {
                TapError::ConfigError(format!(
                    "resume value '{}' is not an ISO-8601 date or date-time",
                    s
                ))
            }),
            (other, target) => Err(TapError::ConfigError(format!(
                "resume value {} ({}) cannot be compared with a {} column",
                other, current, target
            ))),
        }
    }
}

/// Parses `2024-01-31`, `2024-01-31 12:00:00[.ffffff]`, `2024-01-31T12:00:00[.ffffff]`
/// or a full RFC 3339 timestamp.
fn parse_temporal(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(Value::Timestamp(ts.with_timezone(&Utc)));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Value::DateTime(dt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Value::DateTime)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "'{}'", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.6f")),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Value::Decimal(a), Value::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Decimal(a), Value::Float(b)) => a.to_f64().partial_cmp(b),
            (Value::Float(a), Value::Decimal(b)) => a.partial_cmp(&b.to_f64()),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::Timestamp(b)) => a.and_utc().partial_cmp(b),
            (Value::Timestamp(a), Value::DateTime(b)) => a.partial_cmp(&b.and_utc()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

/// An exact decimal number in canonical text form: optional `-`, no
/// leading zeros in the integer part, no trailing zeros in the fraction.
///
/// Serializes to JSON as a bare number token with every digit kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Parses `[+-]digits[.digits]` (either side of the point may be empty, not both).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, unsigned) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return None;
        }

        let int_part = int_part.trim_start_matches('0');
        let frac_part = frac_part.trim_end_matches('0');
        let mut canonical = String::with_capacity(text.len() + 1);
        if negative && !(int_part.is_empty() && frac_part.is_empty()) {
            canonical.push('-');
        }
        canonical.push_str(if int_part.is_empty() { "0" } else { int_part });
        if !frac_part.is_empty() {
            canonical.push('.');
            canonical.push_str(frac_part);
        }
        Some(Decimal(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Nearest `f64`, for comparisons against floating point values only.
    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }

    fn parts(&self) -> (bool, &str, &str) {
        let (negative, unsigned) = match self.0.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.0.as_str()),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        (negative, int_part, frac_part)
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Decimal(v.to_string())
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_neg, a_int, a_frac) = self.parts();
        let (b_neg, b_int, b_frac) = other.parts();
        let magnitude = a_int
            .len()
            .cmp(&b_int.len())
            .then_with(|| a_int.cmp(b_int))
            .then_with(|| a_frac.cmp(b_frac));
        match (a_neg, b_neg) {
            (false, false) => magnitude,
            (true, true) => magnitude.reverse(),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw = serde_json::value::RawValue::from_string(self.0.clone())
            .map_err(<S::Error as ser::Error>::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Decimal::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("'{}' is not a decimal number", text)))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

/// One emitted row: column name to value.
///
/// Records are handed off to the caller; the reader keeps no reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A column selected for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub name: String,
    /// The Oracle type name from the data dictionary (e.g. `TIMESTAMP(6) WITH TIME ZONE`).
    pub raw_type: Option<String>,
    pub domain: Option<ValueDomain>,
    /// Portable type description, when discovery supplied one.
    pub json_type: Option<serde_json::Value>,
}

impl ColumnRef {
    /// A column with no type information; projected as-is.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: None,
            domain: None,
            json_type: None,
        }
    }

    /// A column whose values compare within `domain`.
    pub fn with_domain(name: impl Into<String>, domain: ValueDomain) -> Self {
        Self {
            domain: Some(domain),
            ..Self::untyped(name)
        }
    }
}

/// A resolved, fully-qualified table plus its column projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnRef>,
}

impl TableRef {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<ColumnRef>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns,
        }
    }

    /// Resolves a table reference from discovered metadata.
    ///
    /// With a `projection`, only those columns are selected (in that order);
    /// naming a column the table doesn't have is a configuration error.
    pub fn from_metadata(meta: &TableMetadata, projection: Option<&[String]>) -> Result<Self> {
        let columns = match projection {
            None => meta.columns.iter().map(ColumnMetadata::to_column_ref).collect(),
            Some(names) => names
                .iter()
                .map(|n| {
                    meta.column(n)
                        .map(ColumnMetadata::to_column_ref)
                        .ok_or_else(|| {
                            TapError::ConfigError(format!(
                                "column {} not found in {}.{}",
                                n, meta.schema, meta.table_name
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(Self::new(&meta.schema, &meta.table_name, columns))
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    pub fn stream_id(&self) -> String {
        stream_id(&self.schema, &self.table)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnRef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// The stream identifier used in the catalog and in the output: `<schema>-<table>`.
pub fn stream_id(schema: &str, table: &str) -> String {
    format!("{}-{}", schema, table)
}

/// Parameters for one extraction run of the table reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadRequest {
    /// Column used to sort output and to resume.
    pub order_column: Option<String>,
    /// Rows whose ordering value is below this are skipped.
    pub resume_value: Option<Value>,
    /// Rows per fetch round trip; `None` uses the cursor default.
    pub batch_size: Option<u32>,
    /// Read at most `abort_ceiling + 1` rows.
    pub abort_ceiling: Option<u64>,
    /// Partition context. Always rejected: tables have no natural partitioning here.
    pub partition: Option<serde_json::Value>,
}

impl ReadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order_column(mut self, column: impl Into<String>) -> Self {
        self.order_column = Some(column.into());
        self
    }

    pub fn with_resume_value(mut self, value: impl Into<Value>) -> Self {
        self.resume_value = Some(value.into());
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn with_abort_ceiling(mut self, ceiling: u64) -> Self {
        self.abort_ceiling = Some(ceiling);
        self
    }

    pub fn with_partition(mut self, partition: serde_json::Value) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// `ColumnMetadata` is everything discovery knows about a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// What Oracle calls the type (e.g., "NUMBER").
    pub raw_type: String,
    /// Portable type description, e.g. `{"type": ["integer", "null"]}`.
    pub json_type: serde_json::Value,
    pub domain: Option<ValueDomain>,
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn to_column_ref(&self) -> ColumnRef {
        ColumnRef {
            name: self.name.clone(),
            raw_type: Some(self.raw_type.clone()),
            domain: self.domain,
            json_type: Some(self.json_type.clone()),
        }
    }
}

/// `TableMetadata` is the blueprint for a whole table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub schema: String,
    pub table_name: String,
    pub is_view: bool,
    pub columns: Vec<ColumnMetadata>,
    pub pk_cols: Vec<String>,
}

impl TableMetadata {
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Builds the JSON object schema for the table's records.
    pub fn json_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.json_type.clone()))
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
        })
    }
}

/// One entry in the discovered catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub schema_name: String,
    pub table_name: String,
    pub is_view: bool,
    pub key_properties: Vec<String>,
    pub schema: serde_json::Value,
}

impl CatalogEntry {
    pub fn from_metadata(meta: &TableMetadata) -> Self {
        Self {
            tap_stream_id: stream_id(&meta.schema, &meta.table_name),
            schema_name: meta.schema.clone(),
            table_name: meta.table_name.clone(),
            is_view: meta.is_view,
            key_properties: meta.pk_cols.clone(),
            schema: meta.json_schema(),
        }
    }
}

/// `StreamResult` is the report card for one synced stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamResult {
    pub stream: String,
    /// Records written to the sink.
    pub rows: u64,
    /// How long it took (in seconds).
    pub duration: f64,
    /// Either "SUCCESS" or "FAILED".
    pub status: String,
    /// Ordering value of the last emitted record, for the caller to persist.
    pub high_water_mark: Option<Value>,
    pub error: Option<String>,
}

impl StreamResult {
    pub fn success(
        stream: String,
        rows: u64,
        duration: f64,
        high_water_mark: Option<Value>,
    ) -> Self {
        Self {
            stream,
            rows,
            duration,
            status: "SUCCESS".to_string(),
            high_water_mark,
            error: None,
        }
    }

    pub fn failure(
        stream: String,
        rows: u64,
        high_water_mark: Option<Value>,
        error: String,
    ) -> Self {
        Self {
            stream,
            rows,
            duration: 0.0,
            status: "FAILED".to_string(),
            high_water_mark,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}
