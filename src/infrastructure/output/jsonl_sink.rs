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

//! JSON-lines record output: one `{"stream": .., "record": {..}}` object per line.

use crate::domain::entities::Record;
use crate::domain::errors::{Result, TapError};
use crate::ports::record_sink::RecordSink;
use serde::Serialize;
use std::io::{self, BufWriter, Stdout, Write};
use std::sync::Mutex;

#[derive(Serialize)]
struct RecordMessage<'a> {
    stream: &'a str,
    record: &'a Record,
}

pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonLinesSink<BufWriter<Stdout>> {
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(io::stdout()))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|_| TapError::SerializationError("output writer poisoned".into()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, W>> {
        self.out
            .lock()
            .map_err(|_| TapError::SerializationError("output writer poisoned".into()))
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write_record(&self, stream: &str, record: &Record) -> Result<()> {
        let line = serde_json::to_string(&RecordMessage { stream, record })?;
        let mut out = self.lock()?;
        writeln!(out, "{}", line)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.lock()?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Decimal, Value};
    use chrono::NaiveDate;

    #[test]
    fn test_writes_one_line_per_record() {
        let sink = JsonLinesSink::new(Vec::new());
        let mut record = Record::new();
        record.insert("ID", Value::Int(1));
        record.insert("NAME", Value::Null);
        let hired = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        record.insert("HIRED", Value::DateTime(hired));

        sink.write_record("HR-EMPLOYEES", &record).unwrap();
        sink.write_record("HR-EMPLOYEES", &Record::new()).unwrap();
        sink.flush().unwrap();

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["stream"], "HR-EMPLOYEES");
        assert_eq!(first["record"]["ID"], 1);
        assert!(first["record"]["NAME"].is_null());
        assert_eq!(first["record"]["HIRED"], "2024-01-31T09:30:00");
        assert_eq!(lines[1], r#"{"stream":"HR-EMPLOYEES","record":{}}"#);
    }

    #[test]
    fn test_wide_numbers_are_written_verbatim() {
        let sink = JsonLinesSink::new(Vec::new());
        let mut record = Record::new();
        let balance = Decimal::parse("98765432109876543210.0123456789").unwrap();
        record.insert("BALANCE", Value::Decimal(balance));

        sink.write_record("GL-LEDGER", &record).unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            text.trim_end(),
            r#"{"stream":"GL-LEDGER","record":{"BALANCE":98765432109876543210.0123456789}}"#
        );
    }
}
