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

//! # Oracle Tap
//!
//! Discovers Oracle schemas, tables and views, and reads tables as lazy,
//! batched, resumable record streams.
//!
//! This crate follows the **Hexagonal Architecture** (Ports and Adapters):
//! `domain` and `application` only see the traits in `ports`, and the
//! Oracle-specific code lives in `infrastructure`.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;
