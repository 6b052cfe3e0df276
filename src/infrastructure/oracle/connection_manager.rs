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

//! # Oracle Connection Provisioning
//!
//! Opens connections in one of two modes:
//! - **Thin**: a plain Easy Connect string (`//host:port/service`).
//! - **Thick**: a full TNS connect descriptor, which goes through the
//!   client's complete Oracle Net configuration.
//!
//! Both modes use the same driver. The `oracle` crate always runs on
//! ODPI-C and the Oracle Client libraries, so the modes differ only in how
//! the target is addressed, not in the wire protocol implementation.
//!
//! A thin failure is retried exactly once in thick mode. This is the only
//! retry anywhere in the tap.

use crate::config::DatabaseConfig;
use crate::domain::errors::{Result, TapError};
use crate::infrastructure::oracle::cursor::OracleSourceConnection;
use crate::ports::connection_port::{ConnectionProvider, SourceConnection};
use log::{debug, info, warn};
use oracle::Connection;

/// How one connect attempt addresses the server (Easy Connect or TNS descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireMode {
    Thin,
    Thick,
}

/// `ConnectionProvider` that opens one dedicated Oracle connection per reader.
pub struct OracleConnectionManager {
    user: String,
    pass: String,
    endpoint: String,
    thin_conn_str: String,
    thick_conn_str: String,
}

impl OracleConnectionManager {
    pub fn new(config: &DatabaseConfig, pass: &str) -> Self {
        Self {
            user: config.user.clone(),
            pass: pass.to_string(),
            endpoint: config.endpoint(),
            thin_conn_str: config.get_connection_string(),
            thick_conn_str: config.get_connect_descriptor(),
        }
    }

    pub fn connect_string(&self, mode: WireMode) -> &str {
        match mode {
            WireMode::Thin => &self.thin_conn_str,
            WireMode::Thick => &self.thick_conn_str,
        }
    }

    /// Opens a raw driver connection, falling back to thick mode once.
    pub fn open(&self) -> Result<Connection> {
        let conn = connect_with_fallback(&self.endpoint, |mode| self.connect(mode))?;
        info!("Connected to {}", self.endpoint);
        Ok(conn)
    }

    fn connect(&self, mode: WireMode) -> Result<Connection> {
        debug!("Connecting to {} in {:?} mode", self.endpoint, mode);
        Connection::connect(&self.user, &self.pass, self.connect_string(mode))
            .map_err(TapError::from)
    }
}

impl ConnectionProvider for OracleConnectionManager {
    fn acquire(&self) -> Result<Box<dyn SourceConnection>> {
        Ok(Box::new(OracleSourceConnection::new(self.open()?)?))
    }
}

/// Tries `connect` in thin mode, then once in thick mode.
///
/// If both fail the result is a `ConnectionError` naming the endpoint and
/// both failure reasons.
pub fn connect_with_fallback<C, F>(endpoint: &str, mut connect: F) -> Result<C>
where
    F: FnMut(WireMode) -> Result<C>,
{
    let thin_err = match connect(WireMode::Thin) {
        Ok(conn) => return Ok(conn),
        Err(e) => e,
    };
    warn!(
        "Thin connection to {} failed ({}); retrying in thick mode",
        endpoint, thin_err
    );
    connect(WireMode::Thick).map_err(|thick_err| TapError::ConnectionError {
        endpoint: endpoint.to_string(),
        reason: format!("thin mode: {}; thick mode: {}", thin_err, thick_err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            host: "db.local".into(),
            port: 1521,
            user: "HR".into(),
            password: None,
            dbname: None,
            service_name: Some("ORCLPDB1".into()),
        }
    }

    #[test]
    fn test_thin_success_skips_fallback() {
        let mut modes = Vec::new();
        let res = connect_with_fallback("db.local:1521", |mode| {
            modes.push(mode);
            Ok(mode)
        });
        assert_eq!(res.unwrap(), WireMode::Thin);
        assert_eq!(modes, vec![WireMode::Thin]);
    }

    #[test]
    fn test_thin_failure_retries_thick_once() {
        let mut modes = Vec::new();
        let res = connect_with_fallback("db.local:1521", |mode| {
            modes.push(mode);
            match mode {
                WireMode::Thin => Err(TapError::OracleError("DPY-3010".into())),
                WireMode::Thick => Ok(42),
            }
        });
        assert_eq!(res.unwrap(), 42);
        assert_eq!(modes, vec![WireMode::Thin, WireMode::Thick]);
    }

    #[test]
    fn test_both_modes_failing_is_connection_error() {
        let mut attempts = 0;
        let res: Result<()> = connect_with_fallback("db.local:1521", |_| {
            attempts += 1;
            Err(TapError::OracleError("ORA-12541: no listener".into()))
        });
        assert_eq!(attempts, 2);
        match res {
            Err(TapError::ConnectionError { endpoint, reason }) => {
                assert_eq!(endpoint, "db.local:1521");
                assert!(reason.contains("thin mode"));
                assert!(reason.contains("thick mode"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_manager_connect_strings() {
        let manager = OracleConnectionManager::new(&config(), "secret");
        assert_eq!(manager.connect_string(WireMode::Thin), "//db.local:1521/ORCLPDB1");
        assert!(manager
            .connect_string(WireMode::Thick)
            .contains("(SERVICE_NAME=ORCLPDB1)"));
    }
}
