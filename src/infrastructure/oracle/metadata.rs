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

//! # Oracle Catalog Adapter
//!
//! Talks to Oracle's data dictionary to find out which schemas, tables,
//! views and columns exist, and what each column's portable type is.

use crate::domain::entities::{ColumnMetadata, TableMetadata};
use crate::domain::errors::{Result, TapError};
use crate::domain::mapping;
use crate::infrastructure::oracle::connection_manager::OracleConnectionManager;
use crate::infrastructure::oracle::sql_utils::quote_identifier;
use crate::ports::catalog_port::{CatalogPort, DbObject};
use log::{debug, info};
use oracle::sql_type::{OracleType, ToSql};
use oracle::Connection;
use std::sync::{Arc, Mutex};

/// `OracleCatalogAdapter` implements the `CatalogPort`.
///
/// One dictionary session is opened on first use and shared by every later
/// call, so discovery and per-stream resolution do not reconnect each time.
pub struct OracleCatalogAdapter {
    connections: Arc<OracleConnectionManager>,
    session: LazySession<Connection>,
}

impl OracleCatalogAdapter {
    pub fn new(connections: Arc<OracleConnectionManager>) -> Self {
        Self {
            connections,
            session: LazySession::new(),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        self.session.with(|| self.connections.open(), f)
    }
}

/// A connection opened on demand and kept for reuse.
///
/// A failed open leaves the slot empty, so the next call tries again.
pub struct LazySession<C> {
    slot: Mutex<Option<C>>,
}

impl<C> LazySession<C> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn with<T>(
        &self,
        open: impl FnOnce() -> Result<C>,
        f: impl FnOnce(&C) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| TapError::DiscoveryError("catalog session poisoned".into()))?;
        if slot.is_none() {
            *slot = Some(open()?);
        }
        match slot.as_ref() {
            Some(conn) => f(conn),
            None => Err(TapError::DiscoveryError("catalog session not open".into())),
        }
    }
}

impl<C> Default for LazySession<C> {
    fn default() -> Self {
        Self::new()
    }
}

// --- ORACLE DICTIONARY QUERIES ---

const SQL_LIST_SCHEMAS: &str = "SELECT username FROM all_users ORDER BY username";

const SQL_LIST_TABLES: &str =
    "SELECT table_name FROM all_tables WHERE owner = :1 ORDER BY table_name";

const SQL_LIST_VIEWS: &str = "SELECT view_name FROM all_views WHERE owner = :1 ORDER BY view_name";

const SQL_IS_VIEW: &str = "SELECT COUNT(*) FROM all_views WHERE owner = :1 AND view_name = :2";

/// Column name, dictionary type, scale and nullability, in table order.
const SQL_GET_COLUMNS: &str = "
    SELECT column_name, data_type, data_scale, nullable
    FROM all_tab_columns
    WHERE owner = :1
      AND table_name = :2
    ORDER BY column_id
";

/// Finds primary key columns.
const SQL_GET_PK: &str = "
    SELECT c.column_name
    FROM all_cons_columns c
    JOIN all_constraints k ON c.constraint_name = k.constraint_name AND c.owner = k.owner
    WHERE k.constraint_type = 'P'
      AND k.owner = :1
      AND k.table_name = :2
    ORDER BY c.position
";

impl CatalogPort for OracleCatalogAdapter {
    fn list_schemas(&self) -> Result<Vec<String>> {
        let schemas = self.with_conn(|conn| query_strings(conn, SQL_LIST_SCHEMAS, &[]))?;
        info!("Found {} schemas", schemas.len());
        Ok(schemas)
    }

    fn list_objects(&self, schema: &str) -> Result<Vec<DbObject>> {
        self.with_conn(|conn| {
            let mut objects: Vec<DbObject> = query_strings(conn, SQL_LIST_TABLES, &[&schema])?
                .into_iter()
                .map(|name| DbObject { name, is_view: false })
                .collect();
            objects.extend(
                query_strings(conn, SQL_LIST_VIEWS, &[&schema])?
                    .into_iter()
                    .map(|name| DbObject { name, is_view: true }),
            );
            debug!("{}: {} tables and views", schema, objects.len());
            Ok(objects)
        })
    }

    fn get_table_metadata(&self, schema: &str, table: &str) -> Result<TableMetadata> {
        self.with_conn(|conn| table_metadata(conn, schema, table))
    }
}

fn table_metadata(conn: &Connection, schema: &str, table: &str) -> Result<TableMetadata> {
    let columns = fetch_columns(conn, schema, table)?;
    if columns.is_empty() {
        return Err(TapError::DiscoveryError(format!(
            "{}.{} not found or has no visible columns",
            schema, table
        )));
    }
    let pk_cols = query_strings(conn, SQL_GET_PK, &[&schema, &table])?;

    let is_view = conn
        .query_row_as::<i64>(SQL_IS_VIEW, &[&schema, &table])
        .map_err(discovery_error)?
        > 0;

    Ok(TableMetadata {
        schema: schema.to_string(),
        table_name: table.to_string(),
        is_view,
        columns,
        pk_cols,
    })
}

/// Reads dictionary rows, then runs an empty `WHERE 1=0` select so the
/// driver reports the exact Oracle type of every column.
fn fetch_columns(conn: &Connection, schema: &str, table: &str) -> Result<Vec<ColumnMetadata>> {
    debug!("Fetching columns for {}.{}", schema, table);

    struct ColEntry {
        name: String,
        data_type: String,
        scale: Option<i64>,
        nullable: bool,
    }

    let rows = conn
        .query(SQL_GET_COLUMNS, &[&schema, &table])
        .map_err(discovery_error)?;
    let mut entries = Vec::new();
    for row_res in rows {
        let row = row_res.map_err(discovery_error)?;
        entries.push(ColEntry {
            name: row.get(0).map_err(discovery_error)?,
            data_type: row.get(1).map_err(discovery_error)?,
            scale: row.get(2).map_err(discovery_error)?,
            nullable: row.get::<usize, String>(3).map_err(discovery_error)? == "Y",
        });
    }
    if entries.is_empty() {
        return Ok(vec![]);
    }

    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
    let typed = type_query_sql(schema, table, &names);
    let rows = conn.query(&typed, &[]).map_err(discovery_error)?;
    let driver_types: Vec<OracleType> = rows
        .column_info()
        .iter()
        .map(|c| c.oracle_type().clone())
        .collect();

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| {
            column_metadata(
                &e.name,
                &e.data_type,
                e.scale,
                e.nullable,
                driver_types.get(i),
            )
        })
        .collect())
}

/// `SELECT "A", "B" FROM "S"."T" WHERE 1=0`
pub fn type_query_sql(schema: &str, table: &str, columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    format!(
        "SELECT {} FROM {}.{} WHERE 1=0",
        quoted.join(", "),
        quote_identifier(schema),
        quote_identifier(table)
    )
}

/// Combines dictionary facts with the driver-reported type, if any.
pub fn column_metadata(
    name: &str,
    data_type: &str,
    scale: Option<i64>,
    nullable: bool,
    oracle_type: Option<&OracleType>,
) -> ColumnMetadata {
    let portable = match oracle_type {
        Some(t) => mapping::map_oracle_type(t, Some(data_type)),
        None => mapping::map_raw_type(data_type, scale),
    };
    ColumnMetadata {
        name: name.to_string(),
        raw_type: data_type.to_string(),
        json_type: portable.to_json(nullable),
        domain: portable.domain(),
        nullable,
    }
}

fn query_strings(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<String>> {
    let rows = conn.query(sql, params).map_err(discovery_error)?;
    let mut out = Vec::new();
    for r in rows {
        let row = r.map_err(discovery_error)?;
        out.push(row.get(0).map_err(discovery_error)?);
    }
    Ok(out)
}

fn discovery_error(e: oracle::Error) -> TapError {
    TapError::DiscoveryError(e.to_string())
}
