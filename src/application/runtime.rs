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

//! # Runtime Context
//!
//! Builds the Oracle adapters from configuration and wires them into an
//! `Orchestrator`. No connection is opened here; the first one is opened
//! by whichever port is used first.

use crate::application::orchestrator::Orchestrator;
use crate::config::AppConfig;
use crate::domain::errors::Result;
use crate::infrastructure::oracle::connection_manager::OracleConnectionManager;
use crate::infrastructure::oracle::metadata::OracleCatalogAdapter;
use crate::infrastructure::oracle::sql_utils::OracleQueryBuilder;
use crate::ports::record_sink::RecordSink;
use log::info;
use std::sync::Arc;

/// `RuntimeContext` holds the adapters shared by discovery and sync.
pub struct RuntimeContext {
    pub connections: Arc<OracleConnectionManager>,
    pub catalog: Arc<OracleCatalogAdapter>,
    pub queries: Arc<OracleQueryBuilder>,
}

impl RuntimeContext {
    pub fn init(config: &AppConfig) -> Result<Self> {
        let password = config.database.resolve_password()?;

        info!(
            "Oracle target {} as {} ({})",
            config.database.endpoint(),
            config.database.user,
            config.database.get_connection_string()
        );

        let connections = Arc::new(OracleConnectionManager::new(&config.database, &password));
        let catalog = Arc::new(OracleCatalogAdapter::new(connections.clone()));

        Ok(Self {
            connections,
            catalog,
            queries: Arc::new(OracleQueryBuilder::new()),
        })
    }

    pub fn orchestrator(&self, config: &AppConfig, sink: Arc<dyn RecordSink>) -> Orchestrator {
        Orchestrator::new(
            self.catalog.clone(),
            self.connections.clone(),
            self.queries.clone(),
            sink,
            config.tap.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliArgs;
    use clap::Parser;

    #[test]
    fn test_init_builds_adapters_without_io() {
        let args = CliArgs::parse_from([
            "tap-oracle",
            "--host",
            "h",
            "--user",
            "u",
            "--password",
            "p",
            "--dbname",
            "ORCL",
        ]);
        let config = AppConfig::from_cli(&args).unwrap();
        let ctx = RuntimeContext::init(&config).unwrap();
        assert!(ctx
            .connections
            .connect_string(crate::infrastructure::oracle::connection_manager::WireMode::Thick)
            .contains("(SID=ORCL)"));
    }
}
