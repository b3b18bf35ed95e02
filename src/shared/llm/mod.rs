//! Parsing helpers for JSON replies from language models.

mod parser;
mod response;

pub use parser::{
    extract_json_string, fix_js_string_concatenation, fix_trailing_commas, parse_llm_response,
    LlmParse,
};
pub use response::LlmResponse;
