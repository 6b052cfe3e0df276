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

//! The application logic that drives discovery and sync.
//!
//! Discovery walks the catalog through the schema filter. Sync resolves each
//! configured stream against the catalog, reads it with a `TableReader`,
//! hands records to the sink and aggregates per-stream results.

use crate::application::reader::TableReader;
use crate::config::{StreamConfig, TapConfig};
use crate::domain::entities::{CatalogEntry, ReadRequest, Record, StreamResult, TableRef, Value};
use crate::domain::errors::{Result, TapError};
use crate::ports::catalog_port::CatalogPort;
use crate::ports::connection_port::ConnectionProvider;
use crate::ports::query_port::QueryBuilder;
use crate::ports::record_sink::RecordSink;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates discovery and the sequential sync of every stream.
pub struct Orchestrator {
    catalog: Arc<dyn CatalogPort>,
    connections: Arc<dyn ConnectionProvider>,
    queries: Arc<dyn QueryBuilder>,
    sink: Arc<dyn RecordSink>,
    config: TapConfig,
}

#[derive(Serialize)]
struct SyncReport<'a> {
    summary: ReportSummary,
    details: &'a [StreamResult],
}

#[derive(Serialize)]
struct ReportSummary {
    total_streams: usize,
    success: usize,
    failed: usize,
    total_rows: u64,
    total_duration_seconds: f64,
}

/// Running totals for one stream, kept even when the stream fails.
#[derive(Debug, Default)]
struct Progress {
    rows: u64,
    high_water_mark: Option<Value>,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        connections: Arc<dyn ConnectionProvider>,
        queries: Arc<dyn QueryBuilder>,
        sink: Arc<dyn RecordSink>,
        config: TapConfig,
    ) -> Self {
        Self {
            catalog,
            connections,
            queries,
            sink,
            config,
        }
    }

    /// Lists every table and view in the schemas the filter allows.
    ///
    /// An object whose metadata cannot be read is logged and skipped.
    pub fn discover(&self) -> Result<Vec<CatalogEntry>> {
        let filter = self.config.schema_filter();
        let mut entries = Vec::new();

        for schema in self.catalog.list_schemas()? {
            if !filter.allows(&schema) {
                continue;
            }
            for object in self.catalog.list_objects(&schema)? {
                match self.catalog.get_table_metadata(&schema, &object.name) {
                    Ok(meta) => entries.push(CatalogEntry::from_metadata(&meta)),
                    Err(TapError::DiscoveryError(e)) => {
                        warn!("Skipping {}.{}: {}", schema, object.name, e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!("Discovered {} streams", entries.len());
        Ok(entries)
    }

    /// Syncs every configured stream, or every discovered table when none are configured.
    ///
    /// A failing stream is recorded as `FAILED` and the remaining streams still run.
    pub fn sync(&self) -> Result<Vec<StreamResult>> {
        let start_time = Instant::now();
        info!("Starting sync...");

        let streams = match &self.config.streams {
            Some(streams) => streams.clone(),
            None => self
                .discover()?
                .into_iter()
                .map(|e| StreamConfig::new(e.schema_name, e.table_name))
                .collect(),
        };

        let mut results = Vec::with_capacity(streams.len());
        for stream in &streams {
            let stream_id = crate::domain::entities::stream_id(&stream.schema, &stream.table);
            let started = Instant::now();
            let mut progress = Progress::default();

            let result = match self.sync_stream(stream, &mut progress) {
                Ok(()) => StreamResult::success(
                    stream_id,
                    progress.rows,
                    started.elapsed().as_secs_f64(),
                    progress.high_water_mark,
                ),
                Err(e) => {
                    error!("Stream {} failed: {}", stream_id, e);
                    StreamResult::failure(
                        stream_id,
                        progress.rows,
                        progress.high_water_mark,
                        e.to_string(),
                    )
                }
            };
            self.sink.flush()?;
            results.push(result);
        }

        if let Some(dir) = &self.config.report_dir {
            self.generate_report(dir, &results, start_time.elapsed().as_secs_f64())?;
        }

        Ok(results)
    }

    fn sync_stream(&self, stream: &StreamConfig, progress: &mut Progress) -> Result<()> {
        let table = self.resolve(stream)?;
        let stream_id = table.stream_id();
        info!("Syncing {}", table.qualified_name());

        let mut request = ReadRequest::new();
        request.order_column = stream.order_column.clone();
        request.resume_value = stream.resume_value.clone();
        request.batch_size = self.config.batch_size()?;
        request.abort_ceiling = stream.abort_ceiling;

        let reader = TableReader::new(table, self.queries.clone(), self.connections.clone());
        let records = reader.stream_records(request, Some)?;

        for record in records {
            let record = record?;
            if let Some(limit) = stream.abort_ceiling {
                if progress.rows >= limit {
                    return Err(TapError::AbortLimitExceeded {
                        stream: stream_id,
                        limit,
                    });
                }
            }
            self.sink.write_record(&stream_id, &record)?;
            progress.rows += 1;
            progress.high_water_mark = high_water_mark(&record, stream.order_column.as_deref());
        }

        info!("Synced {} rows from {}", progress.rows, stream_id);
        Ok(())
    }

    /// Looks the stream up in the catalog.
    ///
    /// Unknown tables and columns are configuration errors; anything else
    /// (an unreachable database, say) is returned as is.
    fn resolve(&self, stream: &StreamConfig) -> Result<TableRef> {
        let meta = self
            .catalog
            .get_table_metadata(&stream.schema, &stream.table)
            .map_err(|e| match e {
                TapError::DiscoveryError(reason) => TapError::ConfigError(format!(
                    "stream {}.{} cannot be resolved: {}",
                    stream.schema, stream.table, reason
                )),
                other => other,
            })?;
        TableRef::from_metadata(&meta, stream.columns.as_deref())
    }

    fn generate_report(
        &self,
        dir: &str,
        results: &[StreamResult],
        duration_secs: f64,
    ) -> Result<()> {
        let success = results.iter().filter(|r| r.is_success()).count();
        let total_rows: u64 = results.iter().map(|r| r.rows).sum();

        // Typed rather than `json!` so decimal high-water marks keep every digit.
        let report = SyncReport {
            summary: ReportSummary {
                total_streams: results.len(),
                success,
                failed: results.len() - success,
                total_rows,
                total_duration_seconds: duration_secs,
            },
            details: results,
        };

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let report_path = format!("{}/report_{}.json", dir, timestamp);

        std::fs::create_dir_all(dir)?;
        let file = std::fs::File::create(&report_path)?;
        serde_json::to_writer_pretty(file, &report)?;
        info!("Report written to {}", report_path);

        Ok(())
    }
}

fn high_water_mark(record: &Record, order_column: Option<&str>) -> Option<Value> {
    order_column.and_then(|c| record.get(c)).cloned()
}
