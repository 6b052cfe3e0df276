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

//! Schema allow-list policy applied during discovery.

use std::collections::HashSet;

/// The `SYS` schema holds Oracle's internal catalog and is skipped unless asked for.
const SYSTEM_SCHEMA: &str = "sys";

/// Decides which schemas discovery scans.
///
/// Matching is case-insensitive. `sys` is excluded unless it is itself in
/// the allow-list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaFilter {
    allowed: Option<HashSet<String>>,
}

impl SchemaFilter {
    /// `None` (or an empty list) scans every schema except `sys`.
    pub fn new(allow_list: Option<&[String]>) -> Self {
        let allowed = allow_list
            .map(|names| {
                names
                    .iter()
                    .map(|n| n.trim().to_lowercase())
                    .filter(|n| !n.is_empty())
                    .collect::<HashSet<_>>()
            })
            .filter(|set| !set.is_empty());
        Self { allowed }
    }

    /// Parses a comma-separated allow-list such as `"hr, SALES"`.
    pub fn from_csv(list: &str) -> Self {
        let names: Vec<String> = list.split(',').map(str::to_string).collect();
        Self::new(Some(&names))
    }

    pub fn allows(&self, schema: &str) -> bool {
        let lower = schema.to_lowercase();
        match &self.allowed {
            Some(set) => set.contains(&lower),
            None => lower != SYSTEM_SCHEMA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_allow_list_skips_sys_only() {
        let filter = SchemaFilter::new(None);
        assert!(filter.allows("HR"));
        assert!(filter.allows("SYSTEM"));
        assert!(!filter.allows("SYS"));
        assert!(!filter.allows("sys"));
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let filter = SchemaFilter::from_csv("hr, Sales");
        assert!(filter.allows("HR"));
        assert!(filter.allows("SALES"));
        assert!(!filter.allows("OE"));
        assert!(!filter.allows("SYS"));
    }

    #[test]
    fn test_sys_only_when_allow_listed() {
        let filter = SchemaFilter::new(Some(&["SYS".to_string(), "hr".to_string()]));
        assert!(filter.allows("SYS"));
        assert!(filter.allows("hr"));
    }

    #[test]
    fn test_blank_allow_list_behaves_like_none() {
        let filter = SchemaFilter::from_csv(" , ");
        assert_eq!(filter, SchemaFilter::new(None));
        assert!(filter.allows("HR"));
    }
}
