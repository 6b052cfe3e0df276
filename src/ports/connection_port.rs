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

//! # Connection Port
//!
//! This Port defines the contract for the "Row Source".
//!
//! The table reader never talks to Oracle directly. It asks a
//! `ConnectionProvider` for a connection, executes one prepared query on it,
//! and pulls batches from the returned cursor. Dropping the connection
//! releases it, so the reader's cleanup is plain RAII.

use crate::domain::entities::Value;
use crate::domain::errors::Result;
use crate::ports::query_port::PreparedQuery;

/// One row as returned by the cursor, in projection order.
pub type RawRow = Vec<Value>;

/// A forward-only cursor over the result of one query.
pub trait RowCursor {
    /// Fetches up to `max_rows` rows in one round trip.
    ///
    /// `None` uses the cursor's default fetch size. An empty batch means the
    /// cursor is exhausted.
    fn fetch(&mut self, max_rows: Option<usize>) -> Result<Vec<RawRow>>;
}

/// A live, exclusively-held database connection. Dropping it releases it.
pub trait SourceConnection {
    /// Executes a query and returns a cursor positioned before the first row.
    ///
    /// `fetch_size` is a hint for how many rows each round trip should carry.
    fn execute(
        &mut self,
        query: &PreparedQuery,
        fetch_size: Option<u32>,
    ) -> Result<Box<dyn RowCursor>>;
}

/// Supplies connections. Any retry policy lives behind this trait.
pub trait ConnectionProvider: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn SourceConnection>>;
}
