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

//! In-memory implementations of the connection and catalog ports, used by tests.
//!
//! `MemoryProvider` answers a `PreparedQuery` by interpreting its `SelectSpec`
//! (bound, sort, limit, projection) over rows held in memory, and counts
//! acquisitions, releases and fetch round trips.

use crate::domain::entities::{ColumnMetadata, Record, TableMetadata, Value, ValueDomain};
use crate::domain::errors::{Result, TapError};
use crate::ports::catalog_port::{CatalogPort, DbObject};
use crate::ports::connection_port::{ConnectionProvider, RawRow, RowCursor, SourceConnection};
use crate::ports::query_port::PreparedQuery;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const DEFAULT_FETCH: usize = 100;

#[derive(Debug, Default)]
pub struct MemoryStats {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub fetches: AtomicUsize,
    pub fetch_sizes: Mutex<Vec<Option<usize>>>,
    pub executed: Mutex<Vec<String>>,
}

impl MemoryStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

/// A table held in memory as full records.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub rows: Vec<Record>,
}

impl MemoryTable {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }
}

/// Builds a record from `(column, value)` pairs.
pub fn row(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

/// The three-row `EMPLOYEES` table used throughout the tests.
pub fn employees_table() -> MemoryTable {
    MemoryTable::new(vec![
        row(&[("ID", Value::Int(1)), ("DEPT", Value::Int(10))]),
        row(&[("ID", Value::Int(2)), ("DEPT", Value::Int(10))]),
        row(&[("ID", Value::Int(3)), ("DEPT", Value::Int(20))]),
    ])
}

#[derive(Default)]
pub struct MemoryProvider {
    tables: HashMap<String, MemoryTable>,
    pub stats: Arc<MemoryStats>,
    pub fail_connect: bool,
    /// Fail the cursor on this (1-based) fetch call.
    pub fail_on_fetch: Option<usize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, qualified_name: &str, table: MemoryTable) -> Self {
        self.tables.insert(qualified_name.to_string(), table);
        self
    }
}

impl ConnectionProvider for MemoryProvider {
    fn acquire(&self) -> Result<Box<dyn SourceConnection>> {
        if self.fail_connect {
            return Err(TapError::ConnectionError {
                endpoint: "memory:0".into(),
                reason: "refused".into(),
            });
        }
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            tables: self.tables.clone(),
            stats: self.stats.clone(),
            fail_on_fetch: self.fail_on_fetch,
        }))
    }
}

struct MemoryConnection {
    tables: HashMap<String, MemoryTable>,
    stats: Arc<MemoryStats>,
    fail_on_fetch: Option<usize>,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl SourceConnection for MemoryConnection {
    fn execute(
        &mut self,
        query: &PreparedQuery,
        _fetch_size: Option<u32>,
    ) -> Result<Box<dyn RowCursor>> {
        let spec = &query.spec;
        let name = spec.table.qualified_name();
        self.stats
            .executed
            .lock()
            .map_err(|_| TapError::OracleError("poisoned".into()))?
            .push(query.sql.clone());

        let table = self.tables.get(&name).ok_or_else(|| TapError::QueryError {
            table: name.clone(),
            column: None,
            reason: "ORA-00942: table or view does not exist".into(),
        })?;

        let mut rows: Vec<Record> = table.rows.clone();
        if let Some(bound) = &spec.lower_bound {
            rows.retain(|r| r.get(&bound.column).map_or(false, |v| *v >= bound.value));
        }
        if let Some(order) = &spec.order_by {
            rows.sort_by(|a, b| {
                a.get(order)
                    .partial_cmp(&b.get(order))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        if let Some(limit) = spec.limit {
            rows.truncate(limit as usize);
        }

        let mut projected = VecDeque::with_capacity(rows.len());
        for r in rows {
            let mut raw = Vec::with_capacity(spec.table.columns.len());
            for c in &spec.table.columns {
                let v = r.get(&c.name).cloned().ok_or_else(|| TapError::QueryError {
                    table: name.clone(),
                    column: Some(c.name.clone()),
                    reason: "ORA-00904: invalid identifier".into(),
                })?;
                raw.push(v);
            }
            projected.push_back(raw);
        }

        Ok(Box::new(MemoryCursor {
            rows: projected,
            stats: self.stats.clone(),
            fail_on_fetch: self.fail_on_fetch,
        }))
    }
}

struct MemoryCursor {
    rows: VecDeque<RawRow>,
    stats: Arc<MemoryStats>,
    fail_on_fetch: Option<usize>,
}

impl RowCursor for MemoryCursor {
    fn fetch(&mut self, max_rows: Option<usize>) -> Result<Vec<RawRow>> {
        let call = self.stats.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut sizes) = self.stats.fetch_sizes.lock() {
            sizes.push(max_rows);
        }
        if self.fail_on_fetch == Some(call) {
            return Err(TapError::OracleError(
                "ORA-03113: end-of-file on communication channel".into(),
            ));
        }
        let n = max_rows.unwrap_or(DEFAULT_FETCH).min(self.rows.len());
        Ok(self.rows.drain(..n).collect())
    }
}

/// A catalog backed by fixed metadata.
#[derive(Default)]
pub struct MemoryCatalog {
    pub schemas: Vec<String>,
    pub objects: HashMap<String, Vec<DbObject>>,
    pub tables: HashMap<String, TableMetadata>,
}

impl MemoryCatalog {
    pub fn with_table(mut self, meta: TableMetadata) -> Self {
        if !self.schemas.contains(&meta.schema) {
            self.schemas.push(meta.schema.clone());
        }
        self.objects
            .entry(meta.schema.clone())
            .or_default()
            .push(DbObject {
                name: meta.table_name.clone(),
                is_view: meta.is_view,
            });
        self.tables
            .insert(format!("{}.{}", meta.schema, meta.table_name), meta);
        self
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schemas.push(schema.to_string());
        self
    }
}

impl CatalogPort for MemoryCatalog {
    fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(self.schemas.clone())
    }

    fn list_objects(&self, schema: &str) -> Result<Vec<DbObject>> {
        Ok(self.objects.get(schema).cloned().unwrap_or_default())
    }

    fn get_table_metadata(&self, schema: &str, table: &str) -> Result<TableMetadata> {
        self.tables
            .get(&format!("{}.{}", schema, table))
            .cloned()
            .ok_or_else(|| TapError::DiscoveryError(format!("{}.{} not found", schema, table)))
    }
}

/// Metadata for the `EMPLOYEES` table in `schema`.
pub fn employees_metadata(schema: &str) -> TableMetadata {
    let numeric = |name: &str, nullable: bool| ColumnMetadata {
        name: name.into(),
        raw_type: "NUMBER".into(),
        json_type: if nullable {
            serde_json::json!({"type": ["integer", "null"]})
        } else {
            serde_json::json!({"type": ["integer"]})
        },
        domain: Some(ValueDomain::Numeric),
        nullable,
    };
    TableMetadata {
        schema: schema.into(),
        table_name: "EMPLOYEES".into(),
        is_view: false,
        columns: vec![numeric("ID", false), numeric("DEPT", true)],
        pk_cols: vec!["ID".into()],
    }
}
