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

//! Oracle SQL rendering.
//!
//! This module turns a `SelectSpec` into an Oracle `SELECT` with positional
//! binds, and picks a projection expression per column type so that types
//! the driver can't fetch natively (XMLTYPE, JSON, SDO_GEOMETRY, ROWID)
//! arrive as strings.

use crate::domain::entities::ColumnRef;
use crate::domain::errors::{Result, TapError};
use crate::ports::query_port::{PreparedQuery, QueryBuilder, SelectSpec};

/// `QueryBuilder` for Oracle 12c and later (`FETCH FIRST n ROWS ONLY`).
#[derive(Debug, Default, Clone)]
pub struct OracleQueryBuilder;

impl OracleQueryBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl QueryBuilder for OracleQueryBuilder {
    fn prepare(&self, spec: SelectSpec) -> Result<PreparedQuery> {
        if spec.table.columns.is_empty() {
            return Err(TapError::ConfigError(format!(
                "no columns selected for {}",
                spec.table.qualified_name()
            )));
        }

        let select_parts: Vec<String> = spec.table.columns.iter().map(projection_expr).collect();

        let mut sql = format!(
            "SELECT {} FROM {}.{}",
            select_parts.join(", "),
            quote_identifier(&spec.table.schema),
            quote_identifier(&spec.table.table)
        );

        let mut binds = Vec::new();
        if let Some(bound) = &spec.lower_bound {
            binds.push(bound.value.clone());
            sql.push_str(&format!(
                " WHERE {} >= :{}",
                quote_identifier(&bound.column),
                binds.len()
            ));
        }
        if let Some(order) = &spec.order_by {
            sql.push_str(&format!(" ORDER BY {} ASC", quote_identifier(order)));
        }
        if let Some(limit) = spec.limit {
            sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", limit));
        }

        Ok(PreparedQuery { spec, sql, binds })
    }
}

/// Wraps an identifier in double quotes, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Generates the select-list expression for one column, aliased to its name.
///
/// Handles type-specific conversions (e.g. `ROWIDTOCHAR` for ROWID, WKT for spatial).
pub fn projection_expr(column: &ColumnRef) -> String {
    let quoted = quote_identifier(&column.name);
    let upper = column
        .raw_type
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_default();

    let expr = if upper == "XMLTYPE" {
        format!("sys.XMLType.getStringVal({})", quoted)
    } else if upper == "JSON" {
        format!("JSON_SERIALIZE({})", quoted)
    } else if upper.contains("SDO_GEOMETRY") {
        format!("SDO_UTIL.TO_WKTGEOMETRY({})", quoted)
    } else if upper.contains("ROWID") {
        format!("ROWIDTOCHAR({})", quoted)
    } else {
        return quoted;
    };

    format!("{} AS {}", expr, quoted)
}
