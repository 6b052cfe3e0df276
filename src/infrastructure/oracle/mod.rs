pub mod connection_manager;
pub mod cursor;
pub mod metadata;
pub mod sql_utils;
