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

//! Oracle implementation of the connection and cursor ports.
//!
//! The statement's fetch array size is set to the reader's batch size, so
//! each `RowCursor::fetch` maps onto one driver round trip. Column values
//! are converted to `Value` by Oracle type. `NUMBER` and `FLOAT` values
//! never pass through `f64`: they are fetched as text and kept as `Int` or
//! an exact `Decimal`. Only `BINARY_FLOAT`/`BINARY_DOUBLE` become `Float`.

use crate::domain::entities::{Decimal, Value};
use crate::domain::errors::{Result, TapError};
use crate::ports::connection_port::{RawRow, RowCursor, SourceConnection};
use crate::ports::query_port::PreparedQuery;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use oracle::sql_type::{OracleType, ToSql};
use oracle::{Connection, ResultSet, Row};

/// Rows per round trip when the reader does not set a batch size (the driver default).
pub const DEFAULT_FETCH_ROWS: usize = 100;

/// Decimal binds are sent as text; this pins the separator Oracle uses to read them back.
const SQL_NUMERIC_CHARACTERS: &str = "ALTER SESSION SET NLS_NUMERIC_CHARACTERS = '.,'";

/// A dedicated Oracle connection. Dropping it closes the session.
pub struct OracleSourceConnection {
    conn: Connection,
}

impl OracleSourceConnection {
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute(SQL_NUMERIC_CHARACTERS, &[])?;
        Ok(Self { conn })
    }
}

impl SourceConnection for OracleSourceConnection {
    fn execute(
        &mut self,
        query: &PreparedQuery,
        fetch_size: Option<u32>,
    ) -> Result<Box<dyn RowCursor>> {
        let table = query.spec.table.qualified_name();

        let mut builder = self.conn.statement(&query.sql);
        if let Some(n) = fetch_size {
            builder.fetch_array_size(n);
        }
        let stmt = builder.build().map_err(|e| query_error(&table, e))?;

        let binds: Vec<Box<dyn ToSql>> = query.binds.iter().map(to_bind).collect();
        let params: Vec<&dyn ToSql> = binds.iter().map(|b| b.as_ref()).collect();

        let rows: ResultSet<'static, Row> = stmt
            .into_result_set(&params)
            .map_err(|e| query_error(&table, e))?;
        let col_types: Vec<OracleType> = rows
            .column_info()
            .iter()
            .map(|c| c.oracle_type().clone())
            .collect();

        Ok(Box::new(OracleRowCursor {
            rows,
            col_types,
            table,
        }))
    }
}

/// Forward-only cursor over an Oracle result set.
pub struct OracleRowCursor {
    rows: ResultSet<'static, Row>,
    col_types: Vec<OracleType>,
    table: String,
}

impl RowCursor for OracleRowCursor {
    fn fetch(&mut self, max_rows: Option<usize>) -> Result<Vec<RawRow>> {
        let n = max_rows.unwrap_or(DEFAULT_FETCH_ROWS);
        let mut batch = Vec::with_capacity(n.min(DEFAULT_FETCH_ROWS * 10));
        while batch.len() < n {
            let row = match self.rows.next() {
                Some(row) => row.map_err(|e| query_error(&self.table, e))?,
                None => break,
            };
            let mut values = Vec::with_capacity(self.col_types.len());
            for (i, otype) in self.col_types.iter().enumerate() {
                values.push(value_at(&row, i, otype).map_err(|e| query_error(&self.table, e))?);
            }
            batch.push(values);
        }
        Ok(batch)
    }
}

/// Reads column `i` of `row` as a `Value`, choosing the Rust type from the Oracle type.
pub fn value_at(row: &Row, i: usize, otype: &OracleType) -> oracle::Result<Value> {
    let value = match otype {
        OracleType::Int64 => row.get::<usize, Option<i64>>(i)?.map(Value::Int),
        OracleType::Number(prec, 0) if *prec > 0 && *prec <= 18 => {
            row.get::<usize, Option<i64>>(i)?.map(Value::Int)
        }
        OracleType::Number(_, _) | OracleType::Float(_) | OracleType::UInt64 => row
            .get::<usize, Option<String>>(i)?
            .map(|s| parse_number(&s)),
        OracleType::BinaryFloat | OracleType::BinaryDouble => {
            row.get::<usize, Option<f64>>(i)?.map(Value::Float)
        }
        OracleType::Date | OracleType::Timestamp(_) => row
            .get::<usize, Option<NaiveDateTime>>(i)?
            .map(Value::DateTime),
        OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_) => row
            .get::<usize, Option<DateTime<Utc>>>(i)?
            .map(Value::Timestamp),
        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB => row
            .get::<usize, Option<Vec<u8>>>(i)?
            .map(|b| Value::String(general_purpose::STANDARD.encode(b))),
        OracleType::Boolean => row.get::<usize, Option<bool>>(i)?.map(Value::Bool),
        _ => row.get::<usize, Option<String>>(i)?.map(Value::String),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Parses Oracle's text form of a NUMBER: `Int` when it fits, otherwise an exact `Decimal`.
pub fn parse_number(s: &str) -> Value {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    match Decimal::parse(trimmed) {
        Some(d) => Value::Decimal(d),
        None => Value::String(trimmed.to_string()),
    }
}

/// Converts a bind value into something the driver can bind.
fn to_bind(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::Null => Box::new(Option::<String>::None),
        Value::Bool(b) => Box::new(i64::from(*b)),
        Value::Int(i) => Box::new(*i),
        Value::Float(f) => Box::new(*f),
        Value::Decimal(d) => Box::new(d.as_str().to_string()),
        Value::String(s) => Box::new(s.clone()),
        Value::DateTime(dt) => Box::new(*dt),
        Value::Timestamp(ts) => Box::new(*ts),
    }
}

fn query_error(table: &str, e: oracle::Error) -> TapError {
    let reason = e.to_string();
    TapError::QueryError {
        table: table.to_string(),
        column: invalid_identifier(&reason),
        reason,
    }
}

/// Extracts the column from `ORA-00904: "NAME": invalid identifier`.
pub fn invalid_identifier(message: &str) -> Option<String> {
    if !message.contains("ORA-00904") {
        return None;
    }
    let start = message.find('"')? + 1;
    let len = message[start..].find('"')?;
    Some(message[start..start + len].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Value::Int(42));
        assert_eq!(parse_number("-7"), Value::Int(-7));
        assert_eq!(parse_number("not a number"), Value::String("not a number".into()));
    }

    #[test]
    fn test_wide_numbers_keep_every_digit() {
        let wide = [
            "123456789012345678901234567",
            "12345678901234567.89",
            "-0.000000000000000000001",
        ];
        for text in wide {
            let value = parse_number(text);
            assert!(matches!(value, Value::Decimal(_)), "{} -> {:?}", text, value);
            assert_eq!(serde_json::to_string(&value).unwrap(), text);
        }
        assert_eq!(parse_number(".5").to_string(), "0.5");
    }

    #[test]
    fn test_invalid_identifier() {
        assert_eq!(
            invalid_identifier("ORA-00904: \"HIRE_DAT\": invalid identifier"),
            Some("HIRE_DAT".to_string())
        );
        assert_eq!(
            invalid_identifier("ORA-00942: table or view does not exist"),
            None
        );
    }
}
