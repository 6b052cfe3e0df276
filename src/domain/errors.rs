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

//! Core error definitions for the Oracle tap.
//!
//! This module provides a centralized `TapError` enum and a `Result` type
//! used throughout the crate. Every variant is fatal to the current
//! extraction; filter rejections are not errors and never show up here.

use thiserror::Error;

/// Error types encountered during discovery and extraction.
#[derive(Error, Debug)]
pub enum TapError {
    /// Invalid or missing parameters, detected before any I/O.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The database could not be reached, even after the fallback connection mode.
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionError { endpoint: String, reason: String },

    /// Query planning or execution failed.
    #[error("Query on {table}{} failed: {reason}", column_context(.column))]
    QueryError {
        table: String,
        column: Option<String>,
        reason: String,
    },

    #[error("Catalog discovery failed: {0}")]
    DiscoveryError(String),

    /// More rows matched than the configured processing limit allows.
    #[error("More records available than processing limit ({limit}) for stream {stream}")]
    AbortLimitExceeded { stream: String, limit: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Oracle error: {0}")]
    OracleError(String),
}

fn column_context(column: &Option<String>) -> String {
    match column {
        Some(c) => format!(" (column {})", c),
        None => String::new(),
    }
}

impl From<oracle::Error> for TapError {
    fn from(e: oracle::Error) -> Self {
        TapError::OracleError(e.to_string())
    }
}

impl From<serde_json::Error> for TapError {
    fn from(e: serde_json::Error) -> Self {
        TapError::SerializationError(e.to_string())
    }
}

/// A specialized Result type for the Oracle tap.
pub type Result<T> = std::result::Result<T, TapError>;
