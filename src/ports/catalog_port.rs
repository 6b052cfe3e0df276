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

//! # Catalog Port
//!
//! This Port defines what it means to "discover" a database. It doesn't care
//! if the database is Oracle or a Mock for testing. Any struct that
//! implements `CatalogPort` can be used by the Orchestrator.

use crate::domain::entities::TableMetadata;
use crate::domain::errors::Result;

/// A table or view found in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbObject {
    pub name: String,
    pub is_view: bool,
}

/// `CatalogPort` is the discovery collaborator.
///
/// We add `: Send + Sync` so the port can be shared behind an `Arc`.
pub trait CatalogPort: Send + Sync {
    /// Returns every schema visible to the connected user.
    fn list_schemas(&self) -> Result<Vec<String>>;

    /// Returns the tables and views in a schema.
    fn list_objects(&self, schema: &str) -> Result<Vec<DbObject>>;

    /// Returns columns (with portable types) and primary key for one object.
    fn get_table_metadata(&self, schema: &str, table: &str) -> Result<TableMetadata>;
}
