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

use clap::Parser;
use log::{error, info};
use std::process;
use std::sync::Arc;
use tap_oracle::application::runtime::RuntimeContext;
use tap_oracle::config::{AppConfig, CliArgs};
use tap_oracle::infrastructure::output::jsonl_sink::JsonLinesSink;

fn main() {
    // 1. Initialize Logging
    env_logger::init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = match &args.config {
        Some(config_path) => match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => match AppConfig::from_cli(&args) {
            Ok(c) => c,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
    };

    // Merge CLI overrides
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    // 4. Wire adapters
    let runtime = match RuntimeContext::init(&config) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    let orchestrator = runtime.orchestrator(&config, Arc::new(JsonLinesSink::stdout()));

    // 5. Run
    if args.discover {
        match orchestrator.discover() {
            Ok(catalog) => match serde_json::to_string_pretty(&catalog) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Failed to serialize catalog: {}", e);
                    process::exit(1);
                }
            },
            Err(e) => {
                error!("Discovery failed: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    match orchestrator.sync() {
        Ok(results) => {
            let failed = results.iter().filter(|r| !r.is_success()).count();
            info!(
                "Sync finished: {} streams, {} failed",
                results.len(),
                failed
            );
            if failed > 0 {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            process::exit(1);
        }
    }
}
