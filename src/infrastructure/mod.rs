pub mod oracle;
pub mod output;
