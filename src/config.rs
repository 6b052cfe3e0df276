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

use crate::domain::entities::Value;
use crate::domain::errors::{Result, TapError};
use crate::domain::schema_filter::SchemaFilter;
use clap::Parser;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;

/// Environment variable consulted when neither the file nor the CLI carries a password.
pub const PASSWORD_ENV: &str = "TAP_ORACLE_PASSWORD";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tap: TapConfig,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: Option<String>,
    pub service_name: Option<String>,
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("dbname", &self.dbname)
            .field("service_name", &self.service_name)
            .finish()
    }
}

fn default_port() -> u16 {
    1521
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TapConfig {
    #[serde(default, deserialize_with = "schema_list")]
    pub filter_schemas: Option<Vec<String>>,
    pub batch_size: Option<i64>,
    pub report_dir: Option<String>,
    pub streams: Option<Vec<StreamConfig>>,
}

/// One table to sync, with its incremental settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StreamConfig {
    pub schema: String,
    pub table: String,
    pub order_column: Option<String>,
    pub resume_value: Option<Value>,
    pub abort_ceiling: Option<u64>,
    pub columns: Option<Vec<String>>,
}

impl StreamConfig {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            order_column: None,
            resume_value: None,
            abort_ceiling: None,
            columns: None,
        }
    }
}

/// Accepts either `"hr, sales"` or `[hr, sales]`.
fn schema_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SchemaList {
        Csv(String),
        List(Vec<String>),
    }

    Ok(match Option::<SchemaList>::deserialize(deserializer)? {
        None => None,
        Some(SchemaList::Csv(s)) => Some(split_csv(&s)),
        Some(SchemaList::List(l)) => Some(l),
    })
}

fn split_csv(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print the catalog of discoverable tables and exit
    #[arg(long)]
    pub discover: bool,

    // Overrides for ad-hoc runs
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub dbname: Option<String>,
    #[arg(long)]
    pub service_name: Option<String>,
    /// Comma-separated schema allow-list
    #[arg(long)]
    pub filter_schemas: Option<String>,
    #[arg(long)]
    pub batch_size: Option<i64>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                TapError::ConfigError(format!("invalid config {}: {}", path, e))
            })?
        };

        Ok(config)
    }

    /// Builds a config from CLI flags alone (no `--config`).
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let host = args
            .host
            .clone()
            .ok_or_else(|| TapError::ConfigError("--host is required without --config".into()))?;
        let user = args
            .user
            .clone()
            .ok_or_else(|| TapError::ConfigError("--user is required without --config".into()))?;
        let mut config = AppConfig {
            database: DatabaseConfig {
                host,
                port: default_port(),
                user,
                password: None,
                dbname: None,
                service_name: None,
            },
            tap: TapConfig::default(),
        };
        config.merge_cli(args);
        Ok(config)
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(h) = &args.host { self.database.host = h.clone(); }
        if let Some(p) = args.port { self.database.port = p; }
        if let Some(u) = &args.user { self.database.user = u.clone(); }
        if let Some(p) = &args.password { self.database.password = Some(p.clone()); }
        if let Some(d) = &args.dbname { self.database.dbname = Some(d.clone()); }
        if let Some(s) = &args.service_name { self.database.service_name = Some(s.clone()); }
        if let Some(f) = &args.filter_schemas { self.tap.filter_schemas = Some(split_csv(f)); }
        if let Some(b) = args.batch_size { self.tap.batch_size = Some(b); }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.host.trim().is_empty() {
            return Err(TapError::ConfigError("database.host must not be empty".into()));
        }
        if self.database.user.trim().is_empty() {
            return Err(TapError::ConfigError("database.user must not be empty".into()));
        }
        if self.database.port == 0 {
            return Err(TapError::ConfigError("database.port must be positive".into()));
        }
        self.tap.batch_size()?;
        for stream in self.tap.streams.iter().flatten() {
            if stream.resume_value.is_some() && stream.order_column.is_none() {
                return Err(TapError::ConfigError(format!(
                    "stream {}.{}: resume_value requires order_column",
                    stream.schema, stream.table
                )));
            }
        }
        Ok(())
    }
}

impl TapConfig {
    /// The configured batch size, rejecting zero and negatives.
    pub fn batch_size(&self) -> Result<Option<u32>> {
        match self.batch_size {
            None => Ok(None),
            Some(n) if n > 0 => u32::try_from(n).map(Some).map_err(|_| {
                TapError::ConfigError(format!("batch_size {} is too large", n))
            }),
            Some(n) => Err(TapError::ConfigError(format!(
                "batch_size must be positive, got {}",
                n
            ))),
        }
    }

    pub fn schema_filter(&self) -> SchemaFilter {
        SchemaFilter::new(self.filter_schemas.as_deref())
    }
}

impl DatabaseConfig {
    /// `host:port`, used for error context and logs.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Easy Connect string. The service name wins over the database name.
    pub fn get_connection_string(&self) -> String {
        match self.service_name.as_deref().or(self.dbname.as_deref()) {
            Some(target) => format!("//{}:{}/{}", self.host, self.port, target),
            None => format!("//{}:{}", self.host, self.port),
        }
    }

    /// Full TNS descriptor. A bare database name is treated as a SID.
    pub fn get_connect_descriptor(&self) -> String {
        let connect_data = match (&self.service_name, &self.dbname) {
            (Some(svc), _) => format!("(CONNECT_DATA=(SERVICE_NAME={}))", svc),
            (None, Some(sid)) => format!("(CONNECT_DATA=(SID={}))", sid),
            (None, None) => "(CONNECT_DATA=)".to_string(),
        };
        format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={})(PORT={})){})",
            self.host, self.port, connect_data
        )
    }

    /// Password from the config (already merged with the CLI), else the environment.
    pub fn resolve_password(&self) -> Result<String> {
        self.resolve_password_with(|key| std::env::var(key).ok())
    }

    pub fn resolve_password_with<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = &self.password {
            return Ok(p.clone());
        }
        lookup(PASSWORD_ENV).ok_or_else(|| {
            TapError::ConfigError(format!(
                "no password: set database.password, --password or {}",
                PASSWORD_ENV
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    fn cli() -> CliArgs {
        CliArgs::parse_from(["tap-oracle"])
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml = r#"
database:
  host: "localhost"
  port: 1521
  user: "hr"
  password: "test_password"
  service_name: "ORCLPDB1"
tap:
  filter_schemas: "hr, sales"
  batch_size: 500
  streams:
    - schema: HR
      table: EMPLOYEES
      order_column: EMPLOYEE_ID
      resume_value: 100
      abort_ceiling: 1000
      columns: [EMPLOYEE_ID, LAST_NAME]
"#;
        let file = write_config(yaml, ".yaml");
        let config = AppConfig::from_file(file.path().to_str().unwrap())
            .expect("Failed to parse config");

        assert_eq!(config.database.user, "hr");
        assert_eq!(config.database.port, 1521);
        assert_eq!(
            config.tap.filter_schemas,
            Some(vec!["hr".to_string(), "sales".to_string()])
        );
        assert_eq!(config.tap.batch_size().unwrap(), Some(500));

        let streams = config.tap.streams.unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].order_column.as_deref(), Some("EMPLOYEE_ID"));
        assert_eq!(streams[0].resume_value, Some(Value::Int(100)));
        assert_eq!(streams[0].abort_ceiling, Some(1000));
    }

    #[test]
    fn test_load_json_config_with_schema_list() {
        let json = r#"{
  "database": {"host": "db", "user": "hr", "dbname": "ORCL"},
  "tap": {"filter_schemas": ["HR", "SALES"], "report_dir": "./reports"}
}"#;
        let file = write_config(json, ".json");
        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.database.port, 1521);
        assert_eq!(config.tap.filter_schemas.as_ref().map(|v| v.len()), Some(2));
        assert_eq!(config.tap.report_dir.as_deref(), Some("./reports"));
        assert!(config.tap.schema_filter().allows("sales"));
        assert!(!config.tap.schema_filter().allows("sys"));
    }

    #[test]
    fn test_connection_strings() {
        let mut db = DatabaseConfig {
            host: "db.local".into(),
            port: 1522,
            user: "hr".into(),
            password: None,
            dbname: Some("ORCL".into()),
            service_name: Some("ORCLPDB1".into()),
        };
        assert_eq!(db.get_connection_string(), "//db.local:1522/ORCLPDB1");
        assert_eq!(
            db.get_connect_descriptor(),
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=db.local)(PORT=1522))(CONNECT_DATA=(SERVICE_NAME=ORCLPDB1)))"
        );

        db.service_name = None;
        assert_eq!(db.get_connection_string(), "//db.local:1522/ORCL");
        assert!(db.get_connect_descriptor().contains("(SID=ORCL)"));

        db.dbname = None;
        assert_eq!(db.get_connection_string(), "//db.local:1522");
        assert_eq!(db.endpoint(), "db.local:1522");
    }

    #[test]
    fn test_merge_cli_overrides() {
        let yaml = "database:\n  host: a\n  user: u\n";
        let file = write_config(yaml, ".yml");
        let mut config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();

        let args = CliArgs::parse_from([
            "tap-oracle",
            "--host",
            "b",
            "--port",
            "1600",
            "--service-name",
            "SVC",
            "--filter-schemas",
            "hr,,fin ",
            "--batch-size",
            "10",
        ]);
        config.merge_cli(&args);

        assert_eq!(config.database.host, "b");
        assert_eq!(config.database.port, 1600);
        assert_eq!(config.database.service_name.as_deref(), Some("SVC"));
        assert_eq!(
            config.tap.filter_schemas,
            Some(vec!["hr".to_string(), "fin".to_string()])
        );
        assert_eq!(config.tap.batch_size, Some(10));
    }

    #[test]
    fn test_from_cli_requires_host_and_user() {
        assert!(matches!(AppConfig::from_cli(&cli()), Err(TapError::ConfigError(_))));

        let args = CliArgs::parse_from(["tap-oracle", "--host", "h", "--user", "u"]);
        let config = AppConfig::from_cli(&args).unwrap();
        assert_eq!(config.database.endpoint(), "h:1521");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_batch_size() {
        let args = CliArgs::parse_from(["tap-oracle", "--host", "h", "--user", "u"]);
        let mut config = AppConfig::from_cli(&args).unwrap();

        config.tap.batch_size = Some(0);
        assert!(matches!(config.validate(), Err(TapError::ConfigError(_))));
        config.tap.batch_size = Some(-5);
        assert!(matches!(config.validate(), Err(TapError::ConfigError(_))));
        config.tap.batch_size = Some(5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_resume_without_order_column() {
        let args = CliArgs::parse_from(["tap-oracle", "--host", "h", "--user", "u"]);
        let mut config = AppConfig::from_cli(&args).unwrap();
        let mut stream = StreamConfig::new("HR", "EMPLOYEES");
        stream.resume_value = Some(Value::Int(1));
        config.tap.streams = Some(vec![stream]);

        assert!(matches!(config.validate(), Err(TapError::ConfigError(_))));
    }

    #[test]
    fn test_password_resolution_order() {
        let mut db = DatabaseConfig {
            host: "h".into(),
            port: 1521,
            user: "u".into(),
            password: Some("from-config".into()),
            dbname: None,
            service_name: None,
        };
        let env = |key: &str| (key == PASSWORD_ENV).then(|| "from-env".to_string());

        assert_eq!(db.resolve_password_with(env).unwrap(), "from-config");
        db.password = None;
        assert_eq!(db.resolve_password_with(env).unwrap(), "from-env");
        assert!(db.resolve_password_with(|_| None).is_err());
        assert!(!format!("{:?}", DatabaseConfig { password: Some("s3cr3t".into()), ..db })
            .contains("s3cr3t"));
    }
}
