pub mod catalog_port;
pub mod connection_port;
pub mod query_port;
pub mod record_sink;
