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

//! # Batched Incremental Table Reader
//!
//! This is the heart of the tap. Given a resolved table, an optional
//! ordering column and an optional resume value, it produces an ordered,
//! lazy sequence of records:
//!
//! 1. **Validate** the request before touching the database.
//! 2. **Build** a projection query: ascending sort on the ordering column,
//!    an inclusive `>=` bound for the resume value, and a row limit of
//!    `abort_ceiling + 1`.
//! 3. **Stream**: on the first pull, acquire one connection, execute the
//!    query, then fetch one batch at a time and yield each row as soon as
//!    it has passed the caller's filter.
//!
//! Only one batch is ever held in memory. The connection is released when
//! the cursor is exhausted, when an error is returned, or when the caller
//! drops the stream early, whichever comes first, and never twice.

use crate::domain::entities::{ReadRequest, Record, TableRef};
use crate::domain::errors::{Result, TapError};
use crate::ports::connection_port::{ConnectionProvider, RawRow, RowCursor, SourceConnection};
use crate::ports::query_port::{LowerBound, PreparedQuery, QueryBuilder, SelectSpec};
use log::debug;
use std::sync::{Arc, OnceLock};

/// Reads one table through the query-builder and connection-provider ports.
pub struct TableReader {
    table: TableRef,
    queries: Arc<dyn QueryBuilder>,
    connections: Arc<dyn ConnectionProvider>,
    schema: OnceLock<serde_json::Value>,
}

impl TableReader {
    pub fn new(
        table: TableRef,
        queries: Arc<dyn QueryBuilder>,
        connections: Arc<dyn ConnectionProvider>,
    ) -> Self {
        Self {
            table,
            queries,
            connections,
            schema: OnceLock::new(),
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// The record schema for this stream, computed on first access.
    pub fn schema(&self) -> &serde_json::Value {
        self.schema.get_or_init(|| {
            let properties: serde_json::Map<String, serde_json::Value> = self
                .table
                .columns
                .iter()
                .map(|c| {
                    let t = c.json_type.clone().unwrap_or_else(|| serde_json::json!({}));
                    (c.name.clone(), t)
                })
                .collect();
            serde_json::json!({ "type": "object", "properties": properties })
        })
    }

    /// Starts a lazy read of the table.
    ///
    /// Configuration problems are returned here, before any I/O. Connection
    /// and query failures surface as the first `Err` item of the stream.
    /// `filter` sees each converted record; returning `None` drops it.
    pub fn stream_records<F>(&self, request: ReadRequest, filter: F) -> Result<RecordStream<F>>
    where
        F: FnMut(Record) -> Option<Record>,
    {
        let spec = self.plan(&request)?;
        let query = self.queries.prepare(spec)?;
        debug!(
            "Prepared read of {}: {} (binds: {:?})",
            self.table.qualified_name(),
            query.sql,
            query.binds
        );

        Ok(RecordStream {
            cursor: None,
            connection: None,
            state: StreamState::Pending,
            connections: self.connections.clone(),
            query,
            batch_size: request.batch_size,
            columns: self.table.column_names(),
            batch: Vec::new().into_iter(),
            filter,
            table: self.table.qualified_name(),
            batches: 0,
        })
    }

    /// Validates the request and turns it into a `SelectSpec`.
    fn plan(&self, request: &ReadRequest) -> Result<SelectSpec> {
        let name = self.table.qualified_name();

        if request.partition.is_some() {
            return Err(TapError::ConfigError(format!(
                "partition context is not supported for {}",
                name
            )));
        }
        if self.table.columns.is_empty() {
            return Err(TapError::ConfigError(format!("no columns selected for {}", name)));
        }
        if request.batch_size == Some(0) {
            return Err(TapError::ConfigError(
                "batch size must be a positive integer".to_string(),
            ));
        }

        let order_column = match &request.order_column {
            Some(col) => Some(self.table.column(col).ok_or_else(|| {
                TapError::ConfigError(format!(
                    "ordering column {} is not in the projection of {}",
                    col, name
                ))
            })?),
            None => None,
        };

        let lower_bound = match (&request.resume_value, order_column) {
            (None, _) => None,
            (Some(_), None) => {
                return Err(TapError::ConfigError(format!(
                    "a resume value for {} requires an ordering column",
                    name
                )))
            }
            (Some(value), Some(col)) => {
                let value = match col.domain {
                    Some(domain) => value.clone().coerce_to(domain)?,
                    None if value.is_null() => {
                        return Err(TapError::ConfigError(
                            "resume value must not be null".to_string(),
                        ))
                    }
                    None => value.clone(),
                };
                Some(LowerBound {
                    column: col.name.clone(),
                    value,
                })
            }
        };

        Ok(SelectSpec {
            table: self.table.clone(),
            order_by: order_column.map(|c| c.name.clone()),
            lower_bound,
            limit: request.abort_ceiling.map(|c| c.saturating_add(1)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Nothing acquired yet.
    Pending,
    Open,
    /// Exhausted or failed; resources released.
    Done,
}

/// The lazy record sequence returned by [`TableReader::stream_records`].
///
/// Items are `Result<Record>`; after the first `Err` the stream is finished.
pub struct RecordStream<F> {
    // Fields drop in declaration order: cursor before connection.
    cursor: Option<Box<dyn RowCursor>>,
    connection: Option<Box<dyn SourceConnection>>,
    state: StreamState,
    connections: Arc<dyn ConnectionProvider>,
    query: PreparedQuery,
    batch_size: Option<u32>,
    columns: Vec<String>,
    batch: std::vec::IntoIter<RawRow>,
    filter: F,
    table: String,
    batches: u64,
}

impl<F> RecordStream<F> {
    /// The SQL this stream executes.
    pub fn sql(&self) -> &str {
        &self.query.sql
    }

    fn open(&mut self) -> Result<()> {
        let mut connection = self.connections.acquire()?;
        let cursor = connection
            .execute(&self.query, self.batch_size)
            .map_err(|e| self.query_error(e))?;
        self.connection = Some(connection);
        self.cursor = Some(cursor);
        self.state = StreamState::Open;
        Ok(())
    }

    fn fetch_batch(&mut self) -> Result<Vec<RawRow>> {
        let max_rows = self.batch_size.map(|n| n as usize);
        let fetched = match self.cursor.as_mut() {
            Some(cursor) => cursor.fetch(max_rows),
            None => Ok(Vec::new()),
        };
        let rows = fetched.map_err(|e| self.query_error(e))?;
        self.batches += 1;
        debug!(
            "{}: batch {} returned {} rows",
            self.table,
            self.batches,
            rows.len()
        );
        Ok(rows)
    }

    /// Releases the cursor and connection, once.
    fn finish(&mut self) {
        self.state = StreamState::Done;
        self.batch = Vec::new().into_iter();
        drop(self.cursor.take());
        if self.connection.take().is_some() {
            debug!("{}: connection released after {} batches", self.table, self.batches);
        }
    }

    fn to_record(&self, row: RawRow) -> Result<Record> {
        if row.len() != self.columns.len() {
            return Err(TapError::QueryError {
                table: self.table.clone(),
                column: None,
                reason: format!(
                    "row has {} values for {} selected columns",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        Ok(self.columns.iter().cloned().zip(row).collect())
    }

    fn query_error(&self, err: TapError) -> TapError {
        match err {
            TapError::OracleError(reason) => TapError::QueryError {
                table: self.table.clone(),
                column: None,
                reason,
            },
            other => other,
        }
    }
}

impl<F> Iterator for RecordStream<F>
where
    F: FnMut(Record) -> Option<Record>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.batch.next() {
                let record = match self.to_record(row) {
                    Ok(r) => r,
                    Err(e) => {
                        self.finish();
                        return Some(Err(e));
                    }
                };
                match (self.filter)(record) {
                    Some(kept) => return Some(Ok(kept)),
                    None => continue,
                }
            }

            match self.state {
                StreamState::Done => return None,
                StreamState::Pending => {
                    if let Err(e) = self.open() {
                        self.finish();
                        return Some(Err(e));
                    }
                }
                StreamState::Open => {}
            }

            match self.fetch_batch() {
                Ok(rows) if rows.is_empty() => {
                    self.finish();
                    return None;
                }
                Ok(rows) => self.batch = rows.into_iter(),
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<F> std::iter::FusedIterator for RecordStream<F> where F: FnMut(Record) -> Option<Record> {}
