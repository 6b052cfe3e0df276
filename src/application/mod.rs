pub mod orchestrator;
pub mod reader;
pub mod runtime;

#[cfg(test)]
pub(crate) mod memory_source;
