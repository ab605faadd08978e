pub mod ast_utils;
pub mod config;
pub mod corpus;
pub mod dialect;
pub mod discovery;
pub mod edit;
pub mod errors;
pub mod instrument;
pub mod manifest;
pub mod naming;
pub mod report;
pub mod response_formatter;
pub mod service;
pub mod template;
pub mod tool_router;
pub mod types;

// Re-export commonly used types
pub use types::*;
