//! Lenient parsing of LLM text output into typed values.
//!
//! Providers wrap their JSON in markdown fences, prose, or both, and the
//! JSON itself is frequently slightly malformed. The parser extracts the
//! first balanced object and runs a repair pipeline before giving up.

pub mod parser;
pub mod response;

pub use parser::{extract_json_object, parse_llm_json};
pub use response::json_schema_string;
