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

//! # Query Port
//!
//! The reader describes *what* it wants as a `SelectSpec`; a `QueryBuilder`
//! turns that into dialect SQL plus bind values. The `SelectSpec` travels with the
//! rendered SQL so in-memory sources can answer the same request.

use crate::domain::entities::{TableRef, Value};
use crate::domain::errors::Result;

/// Inclusive lower bound on the ordering column: `column >= value`.
#[derive(Debug, Clone, PartialEq)]
pub struct LowerBound {
    pub column: String,
    pub value: Value,
}

/// A dialect-neutral projection query over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectSpec {
    pub table: TableRef,
    /// Ascending sort column.
    pub order_by: Option<String>,
    pub lower_bound: Option<LowerBound>,
    /// Maximum number of rows to return.
    pub limit: Option<u64>,
}

impl SelectSpec {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            order_by: None,
            lower_bound: None,
            limit: None,
        }
    }
}

/// A `SelectSpec` rendered for a particular database.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub spec: SelectSpec,
    pub sql: String,
    /// Positional bind values (`:1`, `:2`, ...).
    pub binds: Vec<Value>,
}

/// Renders select specs into executable SQL.
pub trait QueryBuilder: Send + Sync {
    fn prepare(&self, spec: SelectSpec) -> Result<PreparedQuery>;
}
